//! Handlers for `/analytics`.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use crate::api::error::ApiError;
use crate::domain::aggregates::analytics::EventData;
use crate::domain::aggregates::EventType;
use crate::domain::value_objects::SessionId;
use crate::services::Storefront;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsParams {
    #[serde(default)]
    pub dashboard: bool,
}

/// `GET /analytics[?dashboard=true]`
pub async fn get_analytics(
    State(shop): State<Storefront>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Response, ApiError> {
    Ok(if params.dashboard {
        Json(shop.analytics.dashboard().await?).into_response()
    } else {
        Json(shop.analytics.report().await?).into_response()
    })
}

#[derive(Debug, Deserialize)]
pub struct TrackBody {
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default)]
    pub data: EventData,
}

/// `POST /analytics`, body `{type, data}`
pub async fn track(
    State(shop): State<Storefront>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<TrackBody>,
) -> Result<Json<Value>, ApiError> {
    shop.analytics.track(&session, body.kind, body.data).await?;
    Ok(Json(json!({ "success": true })))
}
