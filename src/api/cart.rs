//! Handlers for `/cart`. Every route acts on the caller's session.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use crate::api::error::ApiError;
use crate::domain::aggregates::cart::AbandonedCartStats;
use crate::domain::aggregates::{AbandonedCart, Cart};
use crate::domain::value_objects::SessionId;
use crate::services::Storefront;

fn one() -> u32 { 1 }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    pub product_id: u32,
    pub variant_id: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemBody {
    pub product_id: u32,
    pub variant_id: String,
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineParams {
    pub product_id: Option<u32>,
    pub variant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AbandonBody {
    pub email: Option<String>,
}

/// `GET /cart`
pub async fn get_cart(State(shop): State<Storefront>, Extension(session): Extension<SessionId>) -> Result<Json<Cart>, ApiError> {
    Ok(Json(shop.cart.get(&session).await?))
}

/// `POST /cart`, body `{productId, variantId, quantity = 1}`
pub async fn add_item(
    State(shop): State<Storefront>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<AddItemBody>,
) -> Result<Json<Cart>, ApiError> {
    Ok(Json(shop.cart.add(&session, body.product_id, &body.variant_id, body.quantity).await?))
}

/// `PATCH /cart`, body `{productId, variantId, quantity}`; zero or less removes the line.
pub async fn update_item(
    State(shop): State<Storefront>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<UpdateItemBody>,
) -> Result<Json<Cart>, ApiError> {
    Ok(Json(shop.cart.update(&session, body.product_id, &body.variant_id, body.quantity).await?))
}

/// `DELETE /cart[?productId=&variantId=]`. Without both parameters the whole cart is cleared.
pub async fn delete_cart(
    State(shop): State<Storefront>,
    Extension(session): Extension<SessionId>,
    Query(params): Query<LineParams>,
) -> Result<Json<Cart>, ApiError> {
    match (params.product_id, params.variant_id) {
        (Some(product_id), Some(variant_id)) => Ok(Json(shop.cart.remove(&session, product_id, &variant_id).await?)),
        _ => {
            shop.cart.clear(&session).await?;
            Ok(Json(Cart::empty()))
        }
    }
}

/// `POST /cart/abandon`, body `{email?}`
pub async fn abandon(
    State(shop): State<Storefront>,
    Extension(session): Extension<SessionId>,
    body: Option<Json<AbandonBody>>,
) -> Result<(StatusCode, Json<AbandonedCart>), ApiError> {
    let email = body.and_then(|Json(b)| b.email);
    Ok((StatusCode::CREATED, Json(shop.cart.save_abandoned(&session, email).await?)))
}

/// `GET /cart/abandoned/stats`
pub async fn abandoned_stats(State(shop): State<Storefront>) -> Result<Json<AbandonedCartStats>, ApiError> {
    Ok(Json(shop.cart.abandoned_stats().await?))
}
