//! Wishlist Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::Product;

/// A saved product. `variant_id: None` means "any variant".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub product_id: u32,
    pub variant_id: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl WishlistEntry {
    pub fn new(product_id: u32, variant_id: Option<String>) -> Self {
        Self { product_id, variant_id, added_at: Utc::now() }
    }

    pub fn is_for(&self, product_id: u32, variant_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variant_id.as_deref() == variant_id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: u32,
    pub variant_id: Option<String>,
    pub product: Product,
    pub added_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    pub items: Vec<WishlistItem>,
    pub item_count: usize,
}

impl Wishlist {
    pub fn new(items: Vec<WishlistItem>) -> Self {
        let item_count = items.len();
        Self { items, item_count }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistToggle {
    pub in_wishlist: bool,
    pub wishlist: Wishlist,
}
