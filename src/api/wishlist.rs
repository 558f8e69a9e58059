//! Handlers for `/wishlist`, scoped to the caller's session.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use crate::api::error::ApiError;
use crate::domain::aggregates::wishlist::WishlistToggle;
use crate::domain::aggregates::Wishlist;
use crate::domain::value_objects::SessionId;
use crate::services::Storefront;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistBody {
    pub product_id: u32,
    pub variant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryParams {
    pub product_id: Option<u32>,
    pub variant_id: Option<String>,
}

/// `GET /wishlist`
pub async fn get_wishlist(State(shop): State<Storefront>, Extension(session): Extension<SessionId>) -> Result<Json<Wishlist>, ApiError> {
    Ok(Json(shop.wishlist.get(&session).await?))
}

/// `POST /wishlist` toggles membership.
pub async fn toggle(
    State(shop): State<Storefront>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<WishlistBody>,
) -> Result<Json<WishlistToggle>, ApiError> {
    Ok(Json(shop.wishlist.toggle(&session, body.product_id, body.variant_id).await?))
}

/// `DELETE /wishlist[?productId=&variantId=]`. Without `productId` the wishlist is cleared.
pub async fn delete_wishlist(
    State(shop): State<Storefront>,
    Extension(session): Extension<SessionId>,
    Query(params): Query<EntryParams>,
) -> Result<Json<Wishlist>, ApiError> {
    match params.product_id {
        Some(product_id) => Ok(Json(shop.wishlist.remove(&session, product_id, params.variant_id.as_deref()).await?)),
        None => {
            shop.wishlist.clear(&session).await?;
            Ok(Json(Wishlist::new(vec![])))
        }
    }
}
