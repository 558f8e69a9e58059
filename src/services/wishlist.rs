//! Wishlist Manager

use std::sync::Arc;
use tracing::{debug, instrument, warn};
use crate::domain::aggregates::wishlist::{WishlistItem, WishlistToggle};
use crate::domain::aggregates::{Wishlist, WishlistEntry};
use crate::domain::repositories::{CatalogRepository, WishlistRepository};
use crate::domain::value_objects::SessionId;
use crate::{EcommerceError, Result};

#[derive(Clone)]
pub struct WishlistService {
    catalog: Arc<dyn CatalogRepository>,
    wishlists: Arc<dyn WishlistRepository>,
}

impl WishlistService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, wishlists: Arc<dyn WishlistRepository>) -> Self {
        Self { catalog, wishlists }
    }

    /// Saved products in the order they were added. Entries for products
    /// no longer in the catalog are skipped.
    pub async fn get(&self, session: &SessionId) -> Result<Wishlist> {
        let mut items = Vec::new();
        for entry in self.wishlists.entries(session).await? {
            match self.catalog.product(entry.product_id).await? {
                Some(product) => items.push(WishlistItem {
                    product_id: entry.product_id,
                    variant_id: entry.variant_id,
                    product,
                    added_at: entry.added_at,
                }),
                None => warn!(session = %session, product_id = entry.product_id, "dropping wishlist entry for unknown product"),
            }
        }
        Ok(Wishlist::new(items))
    }

    async fn ensure_product(&self, product_id: u32) -> Result<()> {
        match self.catalog.product(product_id).await? {
            Some(_) => Ok(()),
            None => Err(EcommerceError::not_found("Product", product_id)),
        }
    }

    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn add(&self, session: &SessionId, product_id: u32, variant_id: Option<String>) -> Result<Wishlist> {
        self.ensure_product(product_id).await?;
        let added = self.wishlists.insert(session, WishlistEntry::new(product_id, variant_id)).await?;
        debug!(added, "wishlist add");
        self.get(session).await
    }

    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn remove(&self, session: &SessionId, product_id: u32, variant_id: Option<&str>) -> Result<Wishlist> {
        self.wishlists.remove(session, product_id, variant_id).await?;
        self.get(session).await
    }

    pub async fn contains(&self, session: &SessionId, product_id: u32, variant_id: Option<&str>) -> Result<bool> {
        Ok(self
            .wishlists
            .entries(session)
            .await?
            .iter()
            .any(|e| e.is_for(product_id, variant_id)))
    }

    /// Removes the entry if present, adds it otherwise.
    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn toggle(&self, session: &SessionId, product_id: u32, variant_id: Option<String>) -> Result<WishlistToggle> {
        let removed = self.wishlists.remove(session, product_id, variant_id.as_deref()).await?;
        if !removed {
            self.ensure_product(product_id).await?;
            self.wishlists.insert(session, WishlistEntry::new(product_id, variant_id)).await?;
        }
        Ok(WishlistToggle { in_wishlist: !removed, wishlist: self.get(session).await? })
    }

    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn clear(&self, session: &SessionId) -> Result<()> {
        self.wishlists.clear(session).await
    }
}
