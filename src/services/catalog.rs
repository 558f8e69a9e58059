//! Catalog browsing: lookup, search, filtering and sorting.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use rust_decimal::Decimal;
use crate::domain::aggregates::inventory::LOW_STOCK_THRESHOLD;
use crate::domain::aggregates::{Category, Product, Variant};
use crate::domain::repositories::CatalogRepository;
use crate::{EcommerceError, Result};

/// Narrowing criteria for [`CatalogService::filter`]. Unset fields match
/// everything; prices compare against the cheapest variant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub bestselling: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let price = product.min_price();
        if let Some(category) = &self.category {
            if !product.category.eq_ignore_ascii_case(category) { return false; }
        }
        if self.min_price.is_some_and(|min| price < min) { return false; }
        if self.max_price.is_some_and(|max| price > max) { return false; }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| product.has_tag(t)) { return false; }
        if self.in_stock && !product.is_in_stock() { return false; }
        if self.featured && !product.featured { return false; }
        if self.new && !product.new { return false; }
        if self.bestselling && !product.bestselling { return false; }
        true
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey { PriceAsc, PriceDesc, Rating, Newest, #[default] Name }

/// Sorts `products` in place. Stable, so ties keep catalog order.
pub fn sort_products(products: &mut [Product], key: SortKey) {
    match key {
        SortKey::PriceAsc => products.sort_by_key(|p| p.min_price()),
        SortKey::PriceDesc => products.sort_by(|a, b| b.min_price().cmp(&a.min_price())),
        SortKey::Rating => products.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortKey::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Name => products.sort_by_cached_key(|p| p.name.to_lowercase()),
    }
}

fn unique<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(value) { out.push(value.clone()); }
    }
    out
}

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self { Self { catalog } }

    pub async fn list(&self) -> Result<Vec<Product>> { self.catalog.products().await }

    pub async fn get(&self, id: u32) -> Result<Product> {
        self.catalog.product(id).await?.ok_or_else(|| EcommerceError::not_found("Product", id))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Product> {
        self.list()
            .await?
            .into_iter()
            .find(|p| p.slug == slug)
            .ok_or_else(|| EcommerceError::not_found("Product", slug))
    }

    /// The product together with one of its variants.
    pub async fn get_variant(&self, product_id: u32, variant_id: &str) -> Result<(Product, Variant)> {
        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or_else(|| EcommerceError::variant_not_found(product_id, variant_id))?;
        let variant = product
            .variant(variant_id)
            .cloned()
            .ok_or_else(|| EcommerceError::variant_not_found(product_id, variant_id))?;
        Ok((product, variant))
    }

    async fn select(&self, keep: impl Fn(&Product) -> bool) -> Result<Vec<Product>> {
        Ok(self.list().await?.into_iter().filter(|p| keep(p)).collect())
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>> {
        self.select(|p| p.category.eq_ignore_ascii_case(category)).await
    }

    pub async fn by_tag(&self, tag: &str) -> Result<Vec<Product>> {
        self.select(|p| p.has_tag(tag)).await
    }

    pub async fn featured(&self) -> Result<Vec<Product>> { self.select(|p| p.featured).await }
    pub async fn new_arrivals(&self) -> Result<Vec<Product>> { self.select(|p| p.new).await }
    pub async fn bestselling(&self) -> Result<Vec<Product>> { self.select(|p| p.bestselling).await }

    pub async fn categories(&self) -> Result<Vec<Category>> { self.catalog.categories().await }

    /// Distinct product category names in catalog order.
    pub async fn category_names(&self) -> Result<Vec<String>> {
        let products = self.list().await?;
        Ok(unique(products.iter().map(|p| &p.category)))
    }

    pub async fn tags(&self) -> Result<Vec<String>> {
        let products = self.list().await?;
        Ok(unique(products.iter().flat_map(|p| p.tags.iter())))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Product>> {
        self.select(|p| p.matches(query)).await
    }

    pub async fn filter(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        self.select(|p| filter.matches(p)).await
    }

    /// Products with at least one variant whose stock is in `(0, threshold]`.
    pub async fn low_stock(&self, threshold: Option<u32>) -> Result<Vec<Product>> {
        let threshold = threshold.unwrap_or(LOW_STOCK_THRESHOLD);
        self.select(|p| p.variants.iter().any(|v| v.stock() > 0 && v.stock() <= threshold)).await
    }

    pub async fn out_of_stock(&self) -> Result<Vec<Product>> {
        self.select(Product::is_sold_out).await
    }

    pub async fn total_inventory(&self) -> Result<u64> {
        Ok(self.list().await?.iter().map(Product::total_stock).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::fixtures::{product, variant};
    use crate::infrastructure::MemoryStore;
    use chrono::{Duration, Utc};

    fn catalog() -> CatalogService {
        let mut tote = product(1, "Accessories", vec![variant("a", 4800, 23), variant("b", 5200, 0)]);
        tote.name = "Market Tote".into();
        tote.tags = vec!["handmade".into(), "summer".into()];
        tote.featured = true;
        let mut vase = product(2, "Home", vec![variant("c", 4500, 6)]);
        vase.name = "glass vase".into();
        vase.rating = 4.9;
        vase.tags = vec!["glass".into(), "handmade".into()];
        vase.created_at = Utc::now() + Duration::days(1);
        let mut candle = product(3, "Home", vec![variant("d", 4200, 0)]);
        candle.name = "Beeswax Candle".into();
        candle.new = true;
        CatalogService::new(Arc::new(MemoryStore::with_catalog(vec![tote, vase, candle], vec![])))
    }

    fn ids(products: &[Product]) -> Vec<u32> { products.iter().map(|p| p.id).collect() }

    #[tokio::test]
    async fn test_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.get(2).await.unwrap().name, "glass vase");
        assert!(catalog.get(99).await.unwrap_err().is_not_found());
        assert_eq!(catalog.get_by_slug("product-3").await.unwrap().id, 3);
        let (_, v) = catalog.get_variant(1, "b").await.unwrap();
        assert_eq!(v.price.amount(), Decimal::new(5200, 2));
        assert!(catalog.get_variant(1, "zz").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_browse() {
        let catalog = catalog();
        assert_eq!(ids(&catalog.by_category("home").await.unwrap()), [2, 3]);
        assert_eq!(ids(&catalog.by_tag("HANDMADE").await.unwrap()), [1, 2]);
        assert_eq!(ids(&catalog.featured().await.unwrap()), [1]);
        assert_eq!(ids(&catalog.new_arrivals().await.unwrap()), [3]);
        assert_eq!(catalog.category_names().await.unwrap(), ["Accessories", "Home"]);
        assert_eq!(catalog.tags().await.unwrap(), ["handmade", "summer", "glass"]);
        assert_eq!(ids(&catalog.search("TOTE").await.unwrap()), [1]);
    }

    #[tokio::test]
    async fn test_filter() {
        let catalog = catalog();
        let in_stock = ProductFilter { in_stock: true, ..ProductFilter::default() };
        assert_eq!(ids(&catalog.filter(&in_stock).await.unwrap()), [1, 2]);
        let priced = ProductFilter { min_price: Some(Decimal::from(44)), max_price: Some(Decimal::from(48)), ..ProductFilter::default() };
        assert_eq!(ids(&catalog.filter(&priced).await.unwrap()), [1, 2]);
        let tagged = ProductFilter { category: Some("Home".into()), tags: vec!["glass".into()], ..ProductFilter::default() };
        assert_eq!(ids(&catalog.filter(&tagged).await.unwrap()), [2]);
    }

    #[tokio::test]
    async fn test_sort() {
        let mut products = catalog().list().await.unwrap();
        sort_products(&mut products, SortKey::PriceAsc);
        assert_eq!(ids(&products), [3, 2, 1]);
        sort_products(&mut products, SortKey::PriceDesc);
        assert_eq!(ids(&products), [1, 2, 3]);
        sort_products(&mut products, SortKey::Rating);
        assert_eq!(products[0].id, 2);
        sort_products(&mut products, SortKey::Newest);
        assert_eq!(products[0].id, 2);
        sort_products(&mut products, SortKey::Name);
        assert_eq!(ids(&products), [3, 2, 1]);
    }

    #[tokio::test]
    async fn test_stock_views() {
        let catalog = catalog();
        assert_eq!(ids(&catalog.low_stock(None).await.unwrap()), [2]);
        assert_eq!(ids(&catalog.low_stock(Some(30)).await.unwrap()), [1, 2]);
        assert_eq!(ids(&catalog.out_of_stock().await.unwrap()), [3]);
        assert_eq!(catalog.total_inventory().await.unwrap(), 29);
    }

    #[test]
    fn test_sort_key_names() {
        let key: SortKey = serde_json::from_str("\"price-desc\"").unwrap();
        assert_eq!(key, SortKey::PriceDesc);
        assert_eq!(SortKey::default(), SortKey::Name);
    }
}
