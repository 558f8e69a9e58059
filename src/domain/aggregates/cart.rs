//! Cart Aggregate
//!
//! Only [`CartLine`]s are stored. A [`Cart`] is derived on every read by
//! pricing those lines against the live catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::{Product, Variant};
use crate::domain::value_objects::{prefixed_id, Money, MoneyError, STORE_CURRENCY};
use crate::StockIssue;

/// Subtotal at which shipping becomes free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
/// Flat shipping charged below [`FREE_SHIPPING_THRESHOLD`]: 9.99.
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(999, 0, 0, false, 2);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: u32,
    pub variant_id: String,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: u32, variant_id: impl Into<String>, quantity: u32) -> Self {
        Self { product_id, variant_id: variant_id.into(), quantity }
    }

    pub fn is_for(&self, product_id: u32, variant_id: &str) -> bool {
        self.product_id == product_id && self.variant_id == variant_id
    }
}

/// Quantity after adding `requested` to `existing`, capped at `stock`.
pub fn clamp_to_stock(existing: u32, requested: u32, stock: u32) -> u32 {
    existing.saturating_add(requested).min(stock)
}

/// A cart line joined with the product and variant it refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: u32,
    pub variant_id: String,
    pub product_name: String,
    pub variant_name: String,
    pub sku: String,
    pub image: String,
    pub unit_price: Money,
    pub compare_at_price: Option<Money>,
    pub available_stock: u32,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product: &Product, variant: &Variant, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            variant_id: variant.id.clone(),
            product_name: product.name.clone(),
            variant_name: variant.name.clone(),
            sku: variant.sku.to_string(),
            image: variant.image.clone().unwrap_or_else(|| product.image.clone()),
            unit_price: variant.price.clone(),
            compare_at_price: variant.compare_at_price.clone(),
            available_stock: variant.stock(),
            quantity,
        }
    }

    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }

    pub fn stock_issue(&self) -> Option<StockIssue> {
        (self.quantity > self.available_stock).then(|| StockIssue {
            product_id: self.product_id,
            variant_id: self.variant_id.clone(),
            product_name: self.product_name.clone(),
            variant_name: self.variant_name.clone(),
            requested: self.quantity,
            available: self.available_stock,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub item_count: u32,
}

impl Cart {
    pub fn empty() -> Self {
        Self {
            items: vec![], subtotal: Money::default(), shipping: Money::default(),
            total: Money::default(), item_count: 0,
        }
    }

    pub fn from_items(items: Vec<CartItem>) -> Result<Self, MoneyError> {
        let line_totals: Vec<Money> = items.iter().map(CartItem::line_total).collect();
        let subtotal = Money::sum(&line_totals, STORE_CURRENCY)?;
        let shipping = shipping_for(&subtotal);
        let total = subtotal.add(&shipping)?;
        let item_count = items.iter().map(|i| i.quantity).sum();
        Ok(Self { items, subtotal, shipping, total, item_count })
    }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Every line asking for more than the variant currently holds.
    pub fn stock_issues(&self) -> Vec<StockIssue> {
        self.items.iter().filter_map(CartItem::stock_issue).collect()
    }
}

pub fn shipping_for(subtotal: &Money) -> Money {
    if subtotal.amount() >= FREE_SHIPPING_THRESHOLD {
        Money::zero(subtotal.currency())
    } else {
        Money::new(FLAT_SHIPPING, subtotal.currency())
    }
}

/// Snapshot of a cart left behind at checkout, kept for recovery follow-up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonedCart {
    pub id: String,
    pub items: Vec<CartItem>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reminder_sent: bool,
}

impl AbandonedCart {
    pub fn capture(cart: &Cart, email: Option<String>) -> Self {
        Self {
            id: prefixed_id("ABN"), items: cart.items.clone(), email,
            created_at: Utc::now(), reminder_sent: false,
        }
    }

    pub fn value(&self) -> Decimal {
        self.items.iter().map(|i| i.line_total().amount()).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonedCartStats {
    pub total: usize,
    pub recovered: usize,
    pub pending_recovery: usize,
    pub average_value: Money,
}

impl AbandonedCartStats {
    pub fn compute(carts: &[AbandonedCart]) -> Self {
        let value: Decimal = carts.iter().map(AbandonedCart::value).sum();
        Self {
            total: carts.len(),
            recovered: carts.iter().filter(|c| c.reminder_sent && c.email.is_some()).count(),
            pending_recovery: carts.iter().filter(|c| !c.reminder_sent).count(),
            average_value: Money::usd(value).average(carts.len()),
        }
    }
}
