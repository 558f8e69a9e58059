//! JSON REST API for the storefront.
//!
//! Every route under `/api/v1` runs inside the caller's anonymous session
//! (see [`session`]). Auth, TLS and rate limiting are out of scope.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = opensase_storefront::api::router(storefront)
//!     .layer(TraceLayer::new_for_http());
//! ```

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod customers;
pub mod error;
pub mod inventory;
pub mod orders;
pub mod session;
pub mod wishlist;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use crate::services::Storefront;

pub use error::ApiError;
pub use session::SESSION_HEADER;

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "opensase-storefront" }))
}

/// Routes relative to `/api/v1`.
pub fn api_router(shop: Storefront) -> Router<()> {
    Router::new()
        // Catalog
        .route("/products", get(catalog::list))
        .route("/products/:id", get(catalog::get_one))
        .route("/categories", get(catalog::categories))
        // Cart
        .route(
            "/cart",
            get(cart::get_cart).post(cart::add_item).patch(cart::update_item).delete(cart::delete_cart),
        )
        .route("/cart/abandon", post(cart::abandon))
        .route("/cart/abandoned/stats", get(cart::abandoned_stats))
        // Wishlist
        .route(
            "/wishlist",
            get(wishlist::get_wishlist).post(wishlist::toggle).delete(wishlist::delete_wishlist),
        )
        // Inventory
        .route(
            "/inventory",
            get(inventory::get_inventory).post(inventory::record).patch(inventory::acknowledge),
        )
        .route("/inventory/bulk", post(inventory::bulk))
        .route("/inventory/products/:id", get(inventory::product))
        // Orders
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order).patch(orders::update_order),
        )
        .route("/orders/revenue", get(orders::revenue))
        .route("/orders/:id", get(orders::get_order))
        // Customers
        .route("/customers", get(customers::list_customers).patch(customers::update_customer))
        .route("/customers/segments", get(customers::segments))
        .route("/customers/:id", get(customers::get_customer))
        // Analytics
        .route("/analytics", get(analytics::get_analytics).post(analytics::track))
        .with_state(shop)
}

/// `/health` plus the API nested under `/api/v1`, with session handling.
pub fn router(shop: Storefront) -> Router<()> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router(shop))
        .layer(axum::middleware::from_fn(session::session_middleware))
}
