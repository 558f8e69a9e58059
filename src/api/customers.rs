//! Handlers for `/customers`.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use crate::api::error::ApiError;
use crate::domain::aggregates::customer::SegmentDefinition;
use crate::domain::aggregates::{Customer, Segment};
use crate::services::Storefront;
use crate::EcommerceError;

#[derive(Debug, Default, Deserialize)]
pub struct CustomerParams {
    #[serde(default)]
    pub stats: bool,
    pub segment: Option<Segment>,
}

/// `GET /customers[?stats=true|segment=]`
pub async fn list_customers(
    State(shop): State<Storefront>,
    Query(params): Query<CustomerParams>,
) -> Result<Response, ApiError> {
    if params.stats {
        return Ok(Json(shop.customers.stats().await?).into_response());
    }
    let customers = match params.segment {
        Some(segment) => shop.customers.by_segment(segment).await?,
        None => shop.customers.list().await?,
    };
    Ok(Json(customers).into_response())
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TagAction { AddTag, RemoveTag }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerBody {
    pub customer_id: String,
    pub action: TagAction,
    pub tag: String,
}

/// `PATCH /customers`, body `{customerId, action: addTag|removeTag, tag}`
pub async fn update_customer(
    State(shop): State<Storefront>,
    Json(body): Json<UpdateCustomerBody>,
) -> Result<Json<Value>, ApiError> {
    match body.action {
        TagAction::AddTag => shop.customers.add_tag(&body.customer_id, &body.tag).await?,
        TagAction::RemoveTag => shop.customers.remove_tag(&body.customer_id, &body.tag).await?,
    }
    Ok(Json(json!({ "success": true })))
}

/// `GET /customers/:id`
pub async fn get_customer(State(shop): State<Storefront>, Path(id): Path<String>) -> Result<Json<Customer>, ApiError> {
    shop.customers
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| EcommerceError::not_found("Customer", id).into())
}

/// `GET /customers/segments`
pub async fn segments(State(shop): State<Storefront>) -> Json<&'static [SegmentDefinition]> {
    Json(shop.customers.segment_definitions())
}
