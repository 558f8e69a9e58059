//! Inventory Manager
//!
//! The only writer of variant stock. Every movement is logged as an
//! [`InventoryTransaction`] and may raise a stock alert.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use crate::domain::aggregates::inventory::{ProductInventory, TRANSACTION_LOG_CAP};
use crate::domain::aggregates::{InventoryAlert, InventorySummary, InventoryTransaction, TransactionType};
use crate::domain::events::{DomainEvent, EventPublisher, InventoryEvent};
use crate::domain::repositories::{CatalogRepository, InventoryRepository};
use crate::{EcommerceError, Result};

pub const DEFAULT_TRANSACTION_LIMIT: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub product_id: u32,
    pub variant_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: i64,
    pub reason: String,
    pub reference: Option<String>,
}

/// Target level for one variant in [`InventoryService::bulk_update`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: u32,
    pub variant_id: String,
    pub new_stock: u32,
}

#[derive(Clone)]
pub struct InventoryService {
    catalog: Arc<dyn CatalogRepository>,
    inventory: Arc<dyn InventoryRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl InventoryService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, inventory: Arc<dyn InventoryRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { catalog, inventory, publisher }
    }

    #[instrument(skip(self, request), fields(product_id = request.product_id, variant_id = %request.variant_id, kind = ?request.kind))]
    pub async fn record_transaction(&self, request: TransactionRequest) -> Result<InventoryTransaction> {
        let TransactionRequest { product_id, variant_id, kind, quantity, reason, reference } = request;
        let change = self.catalog.apply_stock_change(product_id, &variant_id, kind, quantity).await?;
        let transaction = InventoryTransaction::record(&change, kind, quantity, reason, reference);
        self.inventory.append_transaction(transaction.clone(), TRANSACTION_LOG_CAP).await?;
        info!(id = %transaction.id, previous = change.previous_stock, new = change.new_stock, "stock moved");

        if let Some(alert) = InventoryAlert::for_stock(&change) {
            let event = DomainEvent::Inventory(InventoryEvent::AlertRaised {
                alert_id: alert.id.clone(),
                product_id: alert.product_id,
                variant_id: alert.variant_id.clone(),
                kind: alert.kind,
                current_stock: alert.current_stock,
            });
            if self.inventory.insert_alert_if_new(alert).await? {
                info!(subject = event.subject(), "stock alert raised");
                self.publisher.publish(&event).await;
            }
        }
        Ok(transaction)
    }

    /// Marks an alert handled. Unknown or already acknowledged ids are ignored.
    #[instrument(skip(self))]
    pub async fn acknowledge_alert(&self, alert_id: &str) -> Result<()> {
        if self.inventory.acknowledge_alert(alert_id).await? {
            info!("alert acknowledged");
        }
        Ok(())
    }

    pub async fn summary(&self) -> Result<InventorySummary> {
        Ok(InventorySummary::compute(&self.catalog.products().await?))
    }

    /// Newest first; `limit` defaults to [`DEFAULT_TRANSACTION_LIMIT`].
    pub async fn transactions(&self, limit: Option<usize>) -> Result<Vec<InventoryTransaction>> {
        self.inventory.recent_transactions(limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT)).await
    }

    /// Newest first.
    pub async fn alerts(&self) -> Result<Vec<InventoryAlert>> {
        self.inventory.alerts().await
    }

    /// Applies each level as an `adjustment`, in order. Stops at the first
    /// failure; earlier updates stay applied.
    #[instrument(skip(self, levels), fields(count = levels.len()))]
    pub async fn bulk_update(&self, levels: Vec<StockLevel>) -> Result<Vec<InventoryTransaction>> {
        let mut transactions = Vec::with_capacity(levels.len());
        for level in levels {
            transactions.push(
                self.record_transaction(TransactionRequest {
                    product_id: level.product_id,
                    variant_id: level.variant_id,
                    kind: TransactionType::Adjustment,
                    quantity: i64::from(level.new_stock),
                    reason: "Bulk stock update".into(),
                    reference: None,
                })
                .await?,
            );
        }
        Ok(transactions)
    }

    pub async fn product_inventory(&self, product_id: u32) -> Result<ProductInventory> {
        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or_else(|| EcommerceError::not_found("Product", product_id))?;
        Ok(ProductInventory::of(product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::inventory::AlertType;
    use crate::domain::aggregates::product::fixtures::{product, variant};
    use crate::domain::events::fixtures::RecordingPublisher;
    use crate::infrastructure::MemoryStore;
    use rust_decimal::Decimal;

    fn service() -> (InventoryService, Arc<RecordingPublisher>) {
        let store = Arc::new(MemoryStore::with_catalog(
            vec![product(1, "Home", vec![variant("a", 1000, 12), variant("b", 2000, 40)])],
            vec![],
        ));
        let publisher = Arc::new(RecordingPublisher::default());
        (InventoryService::new(store.clone(), store, publisher.clone()), publisher)
    }

    fn request(kind: TransactionType, quantity: i64) -> TransactionRequest {
        TransactionRequest {
            product_id: 1, variant_id: "a".into(), kind, quantity,
            reason: "test".into(), reference: Some("REF-1".into()),
        }
    }

    #[tokio::test]
    async fn test_transaction_moves_stock() {
        let (inventory, _) = service();
        let t = inventory.record_transaction(request(TransactionType::In, 3)).await.unwrap();
        assert!(t.id.starts_with("TXN-"));
        assert_eq!((t.previous_stock, t.new_stock), (12, 15));
        assert_eq!(t.reference.as_deref(), Some("REF-1"));
        let t = inventory.record_transaction(request(TransactionType::Adjustment, 20)).await.unwrap();
        assert_eq!((t.previous_stock, t.new_stock), (15, 20));
        assert_eq!(inventory.product_inventory(1).await.unwrap().variants[0].variant.stock(), 20);
    }

    #[tokio::test]
    async fn test_out_floors_at_zero() {
        let (inventory, _) = service();
        let first = inventory.record_transaction(request(TransactionType::Out, 50)).await.unwrap();
        assert_eq!(first.new_stock, 0);
        let second = inventory.record_transaction(request(TransactionType::Out, 1)).await.unwrap();
        assert_eq!((second.previous_stock, second.new_stock), (0, 0));
        let log = inventory.transactions(None).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id, second.id);

        let alerts = inventory.alerts().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertType::OutOfStock);
        assert_eq!(alerts[0].threshold, 0);
        assert_eq!(alerts[0].current_stock, 0);
        assert!(!alerts[0].acknowledged);
    }

    #[tokio::test]
    async fn test_unknown_variant() {
        let (inventory, _) = service();
        let mut bad = request(TransactionType::In, 1);
        bad.variant_id = "zz".into();
        assert!(inventory.record_transaction(bad).await.unwrap_err().is_not_found());
        assert!(inventory.transactions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_alerts_are_deduplicated() {
        let (inventory, publisher) = service();
        inventory.record_transaction(request(TransactionType::Adjustment, 5)).await.unwrap();
        inventory.record_transaction(request(TransactionType::Adjustment, 3)).await.unwrap();
        let alerts = inventory.alerts().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertType::LowStock);
        assert_eq!(alerts[0].current_stock, 5);
        assert_eq!(alerts[0].threshold, 10);

        inventory.record_transaction(request(TransactionType::Out, 3)).await.unwrap();
        let alerts = inventory.alerts().await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertType::OutOfStock);
        assert_eq!(publisher.events().len(), 2);

        inventory.acknowledge_alert(&alerts[1].id).await.unwrap();
        inventory.acknowledge_alert(&alerts[1].id).await.unwrap();
        inventory.acknowledge_alert("ALT-missing").await.unwrap();
        inventory.record_transaction(request(TransactionType::Adjustment, 2)).await.unwrap();
        let alerts = inventory.alerts().await.unwrap();
        assert_eq!(alerts.len(), 3);
        assert!(alerts[2].acknowledged);
    }

    #[tokio::test]
    async fn test_bulk_update_and_summary() {
        let (inventory, _) = service();
        let levels = vec![
            StockLevel { product_id: 1, variant_id: "a".into(), new_stock: 0 },
            StockLevel { product_id: 1, variant_id: "b".into(), new_stock: 7 },
        ];
        let transactions = inventory.bulk_update(levels).await.unwrap();
        assert_eq!(transactions.len(), 2);
        assert!(transactions.iter().all(|t| t.kind == TransactionType::Adjustment && t.reason == "Bulk stock update"));

        let summary = inventory.summary().await.unwrap();
        assert_eq!(summary.total_stock, 7);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.out_of_stock_count, 0);
        assert_eq!(summary.inventory_value.amount(), Decimal::new(140, 0));
        assert!(inventory.product_inventory(9).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_transaction_log_is_capped() {
        let (inventory, _) = service();
        for _ in 0..TRANSACTION_LOG_CAP + 5 {
            inventory.record_transaction(request(TransactionType::In, 1)).await.unwrap();
        }
        let all = inventory.transactions(Some(usize::MAX)).await.unwrap();
        assert_eq!(all.len(), TRANSACTION_LOG_CAP);
        assert_eq!(all[0].new_stock, 12 + TRANSACTION_LOG_CAP as u32 + 5);
    }
}
