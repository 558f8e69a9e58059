//! Analytics Recorder

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{instrument, trace};
use crate::domain::aggregates::analytics::{EventData, EVENT_LOG_CAP};
use crate::domain::aggregates::{AnalyticsEvent, AnalyticsReport, DashboardStats, EventType};
use crate::domain::repositories::AnalyticsRepository;
use crate::domain::value_objects::SessionId;
use crate::Result;

fn payload(value: Value) -> EventData {
    match value {
        Value::Object(map) => map,
        _ => EventData::new(),
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    events: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    pub fn new(events: Arc<dyn AnalyticsRepository>) -> Self {
        Self { events }
    }

    #[instrument(skip(self, session, data), fields(session = %session))]
    pub async fn track(&self, session: &SessionId, kind: EventType, data: EventData) -> Result<AnalyticsEvent> {
        let event = AnalyticsEvent::new(session.clone(), kind, data);
        self.events.append(event.clone(), EVENT_LOG_CAP).await?;
        trace!(id = %event.id, "event tracked");
        Ok(event)
    }

    pub async fn track_page_view(&self, session: &SessionId, path: &str) -> Result<AnalyticsEvent> {
        self.track(session, EventType::PageView, payload(json!({ "path": path }))).await
    }

    pub async fn track_product_view(&self, session: &SessionId, product_id: u32, product_name: &str) -> Result<AnalyticsEvent> {
        self.track(
            session,
            EventType::ProductView,
            payload(json!({ "productId": product_id, "productName": product_name })),
        )
        .await
    }

    pub async fn track_add_to_cart(&self, session: &SessionId, product_id: u32, product_name: &str, price: Decimal) -> Result<AnalyticsEvent> {
        self.track(
            session,
            EventType::AddToCart,
            payload(json!({ "productId": product_id, "productName": product_name, "price": price })),
        )
        .await
    }

    pub async fn track_remove_from_cart(&self, session: &SessionId, product_id: u32, product_name: &str) -> Result<AnalyticsEvent> {
        self.track(
            session,
            EventType::RemoveFromCart,
            payload(json!({ "productId": product_id, "productName": product_name })),
        )
        .await
    }

    pub async fn track_checkout_start(&self, session: &SessionId, cart_value: Decimal) -> Result<AnalyticsEvent> {
        self.track(session, EventType::CheckoutStart, payload(json!({ "cartValue": cart_value }))).await
    }

    pub async fn track_checkout_complete(&self, session: &SessionId, order_value: Decimal, order_id: &str) -> Result<AnalyticsEvent> {
        self.track(
            session,
            EventType::CheckoutComplete,
            payload(json!({ "orderValue": order_value, "orderId": order_id })),
        )
        .await
    }

    pub async fn track_search(&self, session: &SessionId, query: &str, results_count: usize) -> Result<AnalyticsEvent> {
        self.track(session, EventType::Search, payload(json!({ "query": query, "resultsCount": results_count }))).await
    }

    pub async fn report(&self) -> Result<AnalyticsReport> {
        Ok(AnalyticsReport::compute(&self.events.events().await?))
    }

    pub async fn dashboard(&self) -> Result<DashboardStats> {
        Ok(DashboardStats::compute(&self.events.events().await?, Utc::now()))
    }
}
