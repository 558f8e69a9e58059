//! Inventory transactions, stock alerts and stock rollups.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::domain::aggregates::product::{Product, Variant};
use crate::domain::value_objects::{prefixed_id, Money};

/// Transactions kept in the log; older ones are dropped.
pub const TRANSACTION_LOG_CAP: usize = 500;
/// Stock at or below this (and above zero) raises a low-stock alert.
pub const LOW_STOCK_ALERT_LEVEL: u32 = 5;
/// Stock at or below this counts as "low" in summaries and on low-stock alerts.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType { In, Out, Adjustment }

impl TransactionType {
    /// Stock after applying `quantity` to `previous`. Never negative.
    pub fn apply(self, previous: u32, quantity: i64) -> u32 {
        let previous = i64::from(previous);
        let next = match self {
            Self::In => previous.saturating_add(quantity),
            Self::Out => previous.saturating_sub(quantity),
            Self::Adjustment => quantity,
        };
        next.clamp(0, i64::from(u32::MAX)) as u32
    }
}

/// Result of applying a stock movement to one variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: u32,
    pub product_name: String,
    pub variant_id: String,
    pub variant_name: String,
    pub previous_stock: u32,
    pub new_stock: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTransaction {
    pub id: String,
    pub product_id: u32,
    pub product_name: String,
    pub variant_id: String,
    pub variant_name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: i64,
    pub previous_stock: u32,
    pub new_stock: u32,
    pub reason: String,
    pub reference: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl InventoryTransaction {
    pub fn record(change: &StockChange, kind: TransactionType, quantity: i64, reason: String, reference: Option<String>) -> Self {
        Self {
            id: prefixed_id("TXN"),
            product_id: change.product_id,
            product_name: change.product_name.clone(),
            variant_id: change.variant_id.clone(),
            variant_name: change.variant_name.clone(),
            kind, quantity,
            previous_stock: change.previous_stock,
            new_stock: change.new_stock,
            reason, reference,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType { LowStock, OutOfStock, Overstock }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAlert {
    pub id: String,
    pub product_id: u32,
    pub product_name: String,
    pub variant_id: String,
    pub variant_name: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub current_stock: u32,
    pub threshold: u32,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
}

impl InventoryAlert {
    /// The alert a stock level calls for, if any.
    pub fn for_stock(change: &StockChange) -> Option<Self> {
        let (kind, threshold) = match change.new_stock {
            0 => (AlertType::OutOfStock, 0),
            s if s <= LOW_STOCK_ALERT_LEVEL => (AlertType::LowStock, LOW_STOCK_THRESHOLD),
            _ => return None,
        };
        Some(Self {
            id: prefixed_id("ALT"),
            product_id: change.product_id,
            product_name: change.product_name.clone(),
            variant_id: change.variant_id.clone(),
            variant_name: change.variant_name.clone(),
            kind,
            current_stock: change.new_stock,
            threshold,
            created_at: Utc::now(),
            acknowledged: false,
        })
    }

    /// An open alert of the same kind for the same variant suppresses this one.
    pub fn duplicates(&self, other: &InventoryAlert) -> bool {
        !other.acknowledged && other.variant_id == self.variant_id && other.kind == self.kind
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInventory { pub stock: u64, pub value: Decimal }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_products: usize,
    pub total_variants: usize,
    pub total_stock: u64,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    pub inventory_value: Money,
    pub categories: BTreeMap<String, CategoryInventory>,
}

impl InventorySummary {
    pub fn compute(products: &[Product]) -> Self {
        let variants = || products.iter().flat_map(|p| p.variants.iter());
        let low_stock_count = variants()
            .filter(|v| v.stock() > 0 && v.stock() <= LOW_STOCK_THRESHOLD)
            .count();
        let out_of_stock_count = products
            .iter()
            .filter(|p| p.is_sold_out())
            .map(|p| p.variants.len())
            .sum();

        let mut categories: BTreeMap<String, CategoryInventory> = BTreeMap::new();
        for product in products {
            let entry = categories.entry(product.category.clone()).or_default();
            for variant in &product.variants {
                entry.stock += u64::from(variant.stock());
                entry.value += variant.stock_value().amount();
            }
        }

        Self {
            total_products: products.len(),
            total_variants: variants().count(),
            total_stock: products.iter().map(Product::total_stock).sum(),
            low_stock_count,
            out_of_stock_count,
            inventory_value: Money::usd(variants().map(|v| v.stock_value().amount()).sum()),
            categories,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInventory { pub variant: Variant, pub stock_value: Money }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInventory {
    pub product: Product,
    pub total_stock: u64,
    pub variants: Vec<VariantInventory>,
}

impl ProductInventory {
    pub fn of(product: Product) -> Self {
        let variants = product.variants.iter()
            .map(|v| VariantInventory { variant: v.clone(), stock_value: v.stock_value() })
            .collect();
        Self { total_stock: product.total_stock(), variants, product }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::fixtures::{product, variant};

    fn change(new_stock: u32) -> StockChange {
        StockChange {
            product_id: 1, product_name: "P".into(), variant_id: "v".into(),
            variant_name: "V".into(), previous_stock: 10, new_stock,
        }
    }

    #[test]
    fn test_apply_arithmetic() {
        assert_eq!(TransactionType::In.apply(3, 4), 7);
        assert_eq!(TransactionType::Out.apply(3, 2), 1);
        assert_eq!(TransactionType::Out.apply(3, 5), 0);
        assert_eq!(TransactionType::Out.apply(0, 1), 0);
        assert_eq!(TransactionType::Adjustment.apply(3, 12), 12);
        assert_eq!(TransactionType::Adjustment.apply(3, -4), 0);
    }

    #[test]
    fn test_alert_levels() {
        assert_eq!(InventoryAlert::for_stock(&change(0)).unwrap().kind, AlertType::OutOfStock);
        let low = InventoryAlert::for_stock(&change(5)).unwrap();
        assert_eq!(low.kind, AlertType::LowStock);
        assert_eq!(low.threshold, LOW_STOCK_THRESHOLD);
        assert!(InventoryAlert::for_stock(&change(6)).is_none());
    }

    #[test]
    fn test_alert_duplicates_only_open_same_kind() {
        let a = InventoryAlert::for_stock(&change(2)).unwrap();
        let mut b = InventoryAlert::for_stock(&change(3)).unwrap();
        assert!(a.duplicates(&b));
        b.acknowledged = true;
        assert!(!a.duplicates(&b));
        let out = InventoryAlert::for_stock(&change(0)).unwrap();
        assert!(!a.duplicates(&out));
    }

    #[test]
    fn test_summary_rollups() {
        let products = vec![
            product(1, "Home", vec![variant("a", 1000, 4), variant("b", 2000, 20)]),
            product(2, "Home", vec![variant("c", 500, 0)]),
            product(3, "Tops", vec![variant("d", 100, 0), variant("e", 100, 1)]),
        ];
        let s = InventorySummary::compute(&products);
        assert_eq!(s.total_products, 3);
        assert_eq!(s.total_variants, 5);
        assert_eq!(s.total_stock, 25);
        assert_eq!(s.low_stock_count, 2);
        assert_eq!(s.out_of_stock_count, 1);
        assert_eq!(s.inventory_value.amount(), Decimal::new(44100, 2));
        assert_eq!(s.categories["Home"].stock, 24);
        assert_eq!(s.categories["Tops"].value, Decimal::new(100, 2));
    }
}
