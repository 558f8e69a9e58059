//! Domain events
//!
//! Raised by aggregates and managers, handed to an [`EventPublisher`] once
//! the state change they describe has been stored.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use crate::domain::aggregates::inventory::AlertType;
use crate::domain::aggregates::order::{OrderStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Inventory(InventoryEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: String, email: String, total: Decimal },
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus },
    PaymentStatusChanged { order_id: String, from: PaymentStatus, to: PaymentStatus },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InventoryEvent {
    AlertRaised { alert_id: String, product_id: u32, variant_id: String, kind: AlertType, current_stock: u32 },
}

impl DomainEvent {
    /// Subject suffix, e.g. `order.placed`.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Placed { .. }) => "order.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "order.status_changed",
            Self::Order(OrderEvent::PaymentStatusChanged { .. }) => "order.payment_status_changed",
            Self::Inventory(InventoryEvent::AlertRaised { .. }) => "inventory.alert_raised",
        }
    }
}

/// Outbound seam for domain events. Delivery is best effort: implementations
/// log failures instead of returning them.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent);
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: &DomainEvent) {
        tracing::trace!(subject = event.subject(), "event publishing disabled");
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every event in memory, in publish order.
    #[derive(Debug, Default)]
    pub struct RecordingPublisher { events: Mutex<Vec<DomainEvent>> }

    impl RecordingPublisher {
        pub fn events(&self) -> Vec<DomainEvent> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: &DomainEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::RecordingPublisher;
    use super::*;

    #[test]
    fn test_event_shape() {
        let e = DomainEvent::Order(OrderEvent::StatusChanged {
            order_id: "ORD-1".into(), from: OrderStatus::Pending, to: OrderStatus::Shipped,
        });
        assert_eq!(e.subject(), "order.status_changed");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["aggregate"], "order");
        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["to"], "shipped");
    }

    #[tokio::test]
    async fn test_recording_publisher_keeps_order() {
        let publisher = RecordingPublisher::default();
        for id in ["ORD-1", "ORD-2"] {
            publisher.publish(&DomainEvent::Order(OrderEvent::Placed {
                order_id: id.into(), email: "a@example.com".into(), total: Decimal::ONE,
            })).await;
        }
        let events = publisher.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], DomainEvent::Order(OrderEvent::Placed { order_id, .. }) if order_id == "ORD-2"));
    }
}
