//! Product Aggregate
//!
//! Catalog reference data. Everything here is read-only to the rest of the
//! crate except a variant's stock counter, which only moves through
//! inventory transactions (see [`crate::services::inventory`]).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::domain::value_objects::{Money, Sku};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub image: String,
    pub images: Vec<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub tags: Vec<String>,
    pub rating: f32,
    pub reviews: u32,
    pub variants: Vec<Variant>,
    pub variant_options: Vec<VariantOption>,
    pub featured: bool,
    pub new: bool,
    pub bestselling: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub name: String,
    pub sku: Sku,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    stock: u32,
    pub attributes: BTreeMap<String, String>,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption { pub name: String, pub values: Vec<String> }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: String,
    pub product_count: u32,
}

impl Product {
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    pub(crate) fn variant_mut(&mut self, variant_id: &str) -> Option<&mut Variant> {
        self.variants.iter_mut().find(|v| v.id == variant_id)
    }

    /// Price of the cheapest variant; zero for a product without variants.
    pub fn min_price(&self) -> Decimal {
        self.variants.iter().map(|v| v.price.amount()).min().unwrap_or(Decimal::ZERO)
    }

    pub fn total_stock(&self) -> u64 { self.variants.iter().map(|v| u64::from(v.stock)).sum() }
    pub fn is_in_stock(&self) -> bool { self.variants.iter().any(|v| v.stock > 0) }
    pub fn is_sold_out(&self) -> bool { self.variants.iter().all(|v| v.stock == 0) }

    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| *t == tag)
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

impl Variant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sku: Sku, price: Money, stock: u32) -> Self {
        Self {
            id: id.into(), name: name.into(), sku, price, compare_at_price: None,
            stock, attributes: BTreeMap::new(), image: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_compare_at_price(mut self, price: Money) -> Self {
        self.compare_at_price = Some(price);
        self
    }

    pub fn stock(&self) -> u32 { self.stock }
    pub fn stock_value(&self) -> Money { self.price.multiply(self.stock) }

    pub(crate) fn set_stock(&mut self, stock: u32) { self.stock = stock; }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn variant(id: &str, price_cents: i64, stock: u32) -> Variant {
        Variant::new(id, id.to_uppercase(), Sku::new(format!("SKU-{id}")).unwrap(), Money::cents(price_cents), stock)
    }

    pub fn product(id: u32, category: &str, variants: Vec<Variant>) -> Product {
        let now = Utc::now();
        Product {
            id, name: format!("Product {id}"), slug: format!("product-{id}"),
            description: format!("Description of product {id}"), short_description: String::new(),
            image: format!("https://img.example/{id}.jpg"), images: vec![], category: category.to_string(),
            subcategory: None, brand: None, tags: vec![], rating: 4.5, reviews: 10, variants,
            variant_options: vec![], featured: false, new: false, bestselling: false,
            created_at: now, updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_min_price_and_stock() {
        let p = product(1, "Home", vec![variant("a", 6500, 3), variant("b", 4800, 0)]);
        assert_eq!(p.min_price(), Decimal::new(4800, 2));
        assert_eq!(p.total_stock(), 3);
        assert!(p.is_in_stock());
        assert!(!p.is_sold_out());
        assert_eq!(p.variant("a").unwrap().stock_value().amount(), Decimal::new(19500, 2));
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let mut p = product(2, "Accessories", vec![]);
        p.tags = vec!["handmade".into()];
        assert!(p.matches("HAND"));
        assert!(p.matches("access"));
        assert!(!p.matches("denim"));
        assert!(p.has_tag("Handmade"));
    }

    #[test]
    fn test_stock_survives_serde() {
        let v = variant("a", 1000, 7);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["stock"], 7);
        let back: Variant = serde_json::from_value(json).unwrap();
        assert_eq!(back.stock(), 7);
    }
}
