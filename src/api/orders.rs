//! Handlers for `/orders`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use crate::api::error::ApiError;
use crate::domain::aggregates::order::{RevenuePeriod, RevenuePoint};
use crate::domain::aggregates::{CheckoutDetails, Order, OrderStatus, PaymentStatus};
use crate::domain::value_objects::SessionId;
use crate::services::Storefront;
use crate::EcommerceError;

#[derive(Debug, Default, Deserialize)]
pub struct OrderParams {
    #[serde(default)]
    pub stats: bool,
    pub email: Option<String>,
}

/// `GET /orders[?stats=true|email=]`
pub async fn list_orders(
    State(shop): State<Storefront>,
    Query(params): Query<OrderParams>,
) -> Result<Response, ApiError> {
    if params.stats {
        return Ok(Json(shop.orders.stats().await?).into_response());
    }
    let orders = match params.email {
        Some(email) => shop.orders.by_customer(&email).await?,
        None => shop.orders.list().await?,
    };
    Ok(Json(orders).into_response())
}

/// `POST /orders` checks out the caller's cart.
pub async fn create_order(
    State(shop): State<Storefront>,
    Extension(session): Extension<SessionId>,
    Json(details): Json<CheckoutDetails>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    Ok((StatusCode::CREATED, Json(shop.orders.create_order(&session, details).await?)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderBody {
    pub order_id: String,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// `PATCH /orders`, body `{orderId, status?, paymentStatus?}`
pub async fn update_order(
    State(shop): State<Storefront>,
    Json(body): Json<UpdateOrderBody>,
) -> Result<Json<Order>, ApiError> {
    if body.status.is_none() && body.payment_status.is_none() {
        return Err(ApiError::BadRequest("status or paymentStatus is required".into()));
    }
    let mut order = None;
    if let Some(status) = body.status {
        order = Some(shop.orders.update_status(&body.order_id, status).await?);
    }
    if let Some(status) = body.payment_status {
        order = Some(shop.orders.update_payment_status(&body.order_id, status).await?);
    }
    order
        .map(Json)
        .ok_or_else(|| EcommerceError::not_found("Order", &body.order_id).into())
}

/// `GET /orders/:id`
pub async fn get_order(State(shop): State<Storefront>, Path(id): Path<String>) -> Result<Json<Order>, ApiError> {
    shop.orders
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| EcommerceError::not_found("Order", id).into())
}

#[derive(Debug, Deserialize)]
pub struct RevenueParams {
    pub period: Option<RevenuePeriod>,
}

/// `GET /orders/revenue?period=day|week|month` (default day)
pub async fn revenue(
    State(shop): State<Storefront>,
    Query(params): Query<RevenueParams>,
) -> Result<Json<Vec<RevenuePoint>>, ApiError> {
    let period = params.period.unwrap_or(RevenuePeriod::Day);
    Ok(Json(shop.orders.revenue_by_period(period).await?))
}
