//! Handlers for `/products` and `/categories`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/products` | Optional `q`, `sort`, `category`, `minPrice`, `maxPrice`, `tags` (comma separated), `inStock`, `featured`, `new`, `bestselling` |
//! | `GET`  | `/products/:id` | Single product |
//! | `GET`  | `/categories` | Category list with product counts |

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use crate::api::error::ApiError;
use crate::domain::aggregates::{Category, Product};
use crate::services::catalog::{sort_products, ProductFilter, SortKey};
use crate::services::Storefront;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub q: Option<String>,
    pub sort: Option<SortKey>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub tags: Option<String>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub new: Option<bool>,
    pub bestselling: Option<bool>,
}

impl ProductQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            category: self.category.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            tags: self
                .tags
                .iter()
                .flat_map(|t| t.split(','))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            in_stock: self.in_stock.unwrap_or(false),
            featured: self.featured.unwrap_or(false),
            new: self.new.unwrap_or(false),
            bestselling: self.bestselling.unwrap_or(false),
        }
    }
}

/// `GET /products`
pub async fn list(
    State(shop): State<Storefront>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let filter = query.filter();
    let mut products = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => shop.catalog.search(q).await?,
        None => shop.catalog.list().await?,
    };
    products.retain(|p| filter.matches(p));
    if let Some(key) = query.sort {
        sort_products(&mut products, key);
    }
    Ok(Json(products))
}

/// `GET /products/:id`
pub async fn get_one(State(shop): State<Storefront>, Path(id): Path<u32>) -> Result<Json<Product>, ApiError> {
    Ok(Json(shop.catalog.get(id).await?))
}

/// `GET /categories`
pub async fn categories(State(shop): State<Storefront>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(shop.catalog.categories().await?))
}
