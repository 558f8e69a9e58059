//! Cart Manager
//!
//! Per-session cart lines, priced against the live catalog on every read.

use std::sync::Arc;
use tracing::{debug, instrument, warn};
use crate::domain::aggregates::cart::AbandonedCartStats;
use crate::domain::aggregates::{AbandonedCart, Cart, CartItem, CartLine};
use crate::domain::repositories::{CartRepository, CatalogRepository};
use crate::domain::value_objects::SessionId;
use crate::{EcommerceError, Result, StockIssue};

#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn CatalogRepository>,
    carts: Arc<dyn CartRepository>,
}

impl CartService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, carts: Arc<dyn CartRepository>) -> Self {
        Self { catalog, carts }
    }

    /// Prices the session's lines. A line whose product or variant has left
    /// the catalog is skipped, not reported.
    pub async fn get(&self, session: &SessionId) -> Result<Cart> {
        let lines = self.carts.lines(session).await?;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self.catalog.product(line.product_id).await?;
            match product.as_ref().and_then(|p| p.variant(&line.variant_id).map(|v| (p, v))) {
                Some((product, variant)) => items.push(CartItem::new(product, variant, line.quantity)),
                None => warn!(
                    session = %session,
                    product_id = line.product_id,
                    variant_id = %line.variant_id,
                    "dropping cart line for unknown variant"
                ),
            }
        }
        Ok(Cart::from_items(items)?)
    }

    async fn variant_stock(&self, product_id: u32, variant_id: &str) -> Result<u32> {
        self.catalog
            .product(product_id)
            .await?
            .and_then(|p| p.variant(variant_id).map(|v| v.stock()))
            .ok_or_else(|| EcommerceError::variant_not_found(product_id, variant_id))
    }

    /// Adds `quantity` to the line, never beyond the variant's stock.
    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn add(&self, session: &SessionId, product_id: u32, variant_id: &str, quantity: u32) -> Result<Cart> {
        let stock = self.variant_stock(product_id, variant_id).await?;
        let next = self.carts.add_to_line(session, product_id, variant_id, quantity, stock).await?;
        debug!(next, stock, "cart line added");
        self.get(session).await
    }

    /// Sets the line's quantity. Zero or less removes it; a line that is not
    /// in the cart is left alone.
    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn update(&self, session: &SessionId, product_id: u32, variant_id: &str, quantity: i64) -> Result<Cart> {
        let stock = self.variant_stock(product_id, variant_id).await?;
        if self.carts.line(session, product_id, variant_id).await?.is_none() {
            debug!("update for a line not in the cart");
            return self.get(session).await;
        }
        if quantity <= 0 {
            self.carts.delete_line(session, product_id, variant_id).await?;
        } else {
            let next = u32::try_from(quantity).unwrap_or(u32::MAX).min(stock);
            if next == 0 {
                self.carts.delete_line(session, product_id, variant_id).await?;
            } else {
                self.carts.put_line(session, CartLine::new(product_id, variant_id, next)).await?;
            }
        }
        self.get(session).await
    }

    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn remove(&self, session: &SessionId, product_id: u32, variant_id: &str) -> Result<Cart> {
        self.carts.delete_line(session, product_id, variant_id).await?;
        self.get(session).await
    }

    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn clear(&self, session: &SessionId) -> Result<()> {
        self.carts.clear(session).await
    }

    /// Lines that ask for more than their variant currently holds.
    pub fn validate_stock(cart: &Cart) -> Vec<StockIssue> {
        cart.stock_issues()
    }

    /// Snapshots the current cart for recovery follow-up.
    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn save_abandoned(&self, session: &SessionId, email: Option<String>) -> Result<AbandonedCart> {
        let cart = self.get(session).await?;
        let abandoned = AbandonedCart::capture(&cart, email);
        self.carts.save_abandoned(abandoned.clone()).await?;
        debug!(id = %abandoned.id, items = abandoned.items.len(), "cart abandoned");
        Ok(abandoned)
    }

    pub async fn abandoned(&self) -> Result<Vec<AbandonedCart>> {
        self.carts.abandoned().await
    }

    pub async fn abandoned_stats(&self) -> Result<AbandonedCartStats> {
        Ok(AbandonedCartStats::compute(&self.carts.abandoned().await?))
    }
}
