//! Handlers for `/inventory`.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/inventory` | `?type=summary|alerts|transactions` (default summary), `limit` for transactions |
//! | `POST`  | `/inventory` | Body: [`TransactionRequest`]; returns 201 + transaction |
//! | `PATCH` | `/inventory` | Body: `{"alertId": "..."}`; acknowledges the alert |
//! | `POST`  | `/inventory/bulk` | Body: `{"updates": [{productId, variantId, newStock}]}` |
//! | `GET`   | `/inventory/products/:id` | Per-variant stock and value for one product |

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use crate::api::error::ApiError;
use crate::domain::aggregates::inventory::ProductInventory;
use crate::domain::aggregates::InventoryTransaction;
use crate::services::inventory::{StockLevel, TransactionRequest};
use crate::services::Storefront;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryView { #[default] Summary, Alerts, Transactions }

#[derive(Debug, Default, Deserialize)]
pub struct InventoryParams {
    #[serde(rename = "type", default)]
    pub view: InventoryView,
    pub limit: Option<usize>,
}

/// `GET /inventory`
pub async fn get_inventory(
    State(shop): State<Storefront>,
    Query(params): Query<InventoryParams>,
) -> Result<Response, ApiError> {
    Ok(match params.view {
        InventoryView::Summary => Json(shop.inventory.summary().await?).into_response(),
        InventoryView::Alerts => Json(shop.inventory.alerts().await?).into_response(),
        InventoryView::Transactions => Json(shop.inventory.transactions(params.limit).await?).into_response(),
    })
}

/// `POST /inventory`
pub async fn record(
    State(shop): State<Storefront>,
    Json(request): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<InventoryTransaction>), ApiError> {
    Ok((StatusCode::CREATED, Json(shop.inventory.record_transaction(request).await?)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeBody {
    pub alert_id: String,
}

/// `PATCH /inventory`
pub async fn acknowledge(
    State(shop): State<Storefront>,
    Json(body): Json<AcknowledgeBody>,
) -> Result<Json<Value>, ApiError> {
    shop.inventory.acknowledge_alert(&body.alert_id).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct BulkBody {
    pub updates: Vec<StockLevel>,
}

/// `POST /inventory/bulk`
pub async fn bulk(
    State(shop): State<Storefront>,
    Json(body): Json<BulkBody>,
) -> Result<Json<Vec<InventoryTransaction>>, ApiError> {
    Ok(Json(shop.inventory.bulk_update(body.updates).await?))
}

/// `GET /inventory/products/:id`
pub async fn product(
    State(shop): State<Storefront>,
    Path(id): Path<u32>,
) -> Result<Json<ProductInventory>, ApiError> {
    Ok(Json(shop.inventory.product_inventory(id).await?))
}
