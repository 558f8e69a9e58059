//! NATS event publisher

use async_trait::async_trait;
use tracing::{debug, warn};
use crate::domain::events::{DomainEvent, EventPublisher};

/// Publishes each event as JSON on `<prefix>.<subject>`,
/// e.g. `storefront.order.placed`.
pub struct NatsPublisher {
    client: async_nats::Client,
    prefix: String,
}

impl NatsPublisher {
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, async_nats::ConnectError> {
        let client = async_nats::connect(url).await?;
        Ok(Self { client, prefix: prefix.into() })
    }

    fn subject_for(&self, event: &DomainEvent) -> String {
        format!("{}.{}", self.prefix, event.subject())
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &DomainEvent) {
        let subject = self.subject_for(event);
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, subject, "failed to encode event");
                return;
            }
        };
        match self.client.publish(subject.clone(), payload.into()).await {
            Ok(()) => debug!(subject, "event published"),
            Err(e) => warn!(error = %e, subject, "failed to publish event"),
        }
    }
}
