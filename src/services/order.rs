//! Order Manager
//!
//! Checkout turns the session's cart into an [`Order`]. Stock is taken line
//! by line; if a later step fails, every decrement already applied is put
//! back with an `in` transaction and the cart is left untouched. Once the
//! order is stored, checkout succeeds even if clearing the cart or tracking
//! the completion fails.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::Validate;
use crate::domain::aggregates::customer::normalize_email;
use crate::domain::aggregates::order::{revenue_by_period, RevenuePeriod, RevenuePoint};
use crate::domain::aggregates::{CheckoutDetails, InventoryTransaction, Order, OrderStats, OrderStatus, PaymentStatus, TransactionType};
use crate::domain::events::EventPublisher;
use crate::domain::repositories::OrderRepository;
use crate::domain::value_objects::SessionId;
use crate::services::analytics::AnalyticsService;
use crate::services::cart::CartService;
use crate::services::customer::CustomerService;
use crate::services::inventory::{InventoryService, TransactionRequest};
use crate::{EcommerceError, Result};

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    carts: CartService,
    inventory: InventoryService,
    customers: CustomerService,
    analytics: AnalyticsService,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        carts: CartService,
        inventory: InventoryService,
        customers: CustomerService,
        analytics: AnalyticsService,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self { orders, carts, inventory, customers, analytics, publisher }
    }

    #[instrument(skip(self, session, details), fields(session = %session))]
    pub async fn create_order(&self, session: &SessionId, details: CheckoutDetails) -> Result<Order> {
        details.validate()?;
        let cart = self.carts.get(session).await?;
        if cart.is_empty() {
            return Err(EcommerceError::EmptyCart);
        }
        let issues = CartService::validate_stock(&cart);
        if !issues.is_empty() {
            warn!(count = issues.len(), "checkout blocked by stock");
            return Err(EcommerceError::StockValidation(issues));
        }

        let contact = details.customer.clone();
        let mut order = Order::place(&cart, details);
        let order_id = order.id().to_string();

        let mut taken = Vec::with_capacity(order.items().len());
        for item in order.items() {
            let request = TransactionRequest {
                product_id: item.product_id,
                variant_id: item.variant_id.clone(),
                kind: TransactionType::Out,
                quantity: i64::from(item.quantity),
                reason: format!("Order {order_id}"),
                reference: Some(order_id.clone()),
            };
            match self.inventory.record_transaction(request).await {
                Ok(transaction) => taken.push(transaction),
                Err(e) => {
                    self.restore_stock(&order_id, &taken).await;
                    return Err(e);
                }
            }
        }

        let phone = Some(contact.phone).filter(|p| !p.is_empty());
        let customer = match self.customers.upsert(&contact.email, &contact.name, phone, order.total()).await {
            Ok(customer) => customer,
            Err(e) => {
                self.restore_stock(&order_id, &taken).await;
                return Err(e);
            }
        };
        order.attach_customer(customer);
        if let Err(e) = self.orders.insert(&order).await {
            self.restore_stock(&order_id, &taken).await;
            return Err(e);
        }

        // Past this point the order stands; follow-up failures are only logged.
        if let Err(e) = self.carts.clear(session).await {
            error!(error = %e, order_id = %order_id, "order placed but cart not cleared");
        }
        if let Err(e) = self.analytics.track_checkout_complete(session, order.total().amount(), &order_id).await {
            warn!(error = %e, order_id = %order_id, "checkout completion not tracked");
        }
        self.publish(&mut order).await;
        info!(order_id = %order_id, total = %order.total(), items = order.items().len(), "order placed");
        Ok(order)
    }

    /// Puts back what `taken` removed. Failures here are logged; the
    /// original checkout error is what the caller sees.
    async fn restore_stock(&self, order_id: &str, taken: &[InventoryTransaction]) {
        for transaction in taken {
            let removed = transaction.previous_stock.saturating_sub(transaction.new_stock);
            if removed == 0 {
                continue;
            }
            let request = TransactionRequest {
                product_id: transaction.product_id,
                variant_id: transaction.variant_id.clone(),
                kind: TransactionType::In,
                quantity: i64::from(removed),
                reason: format!("Order {order_id} rolled back"),
                reference: Some(order_id.to_string()),
            };
            if let Err(e) = self.inventory.record_transaction(request).await {
                error!(error = %e, order_id, variant_id = %transaction.variant_id, "failed to restore stock");
            }
        }
        warn!(order_id, restored = taken.len(), "checkout rolled back");
    }

    async fn publish(&self, order: &mut Order) {
        for event in order.take_events() {
            self.publisher.publish(&event).await;
        }
    }

    async fn find(&self, id: &str) -> Result<Order> {
        self.orders.get(id).await?.ok_or_else(|| EcommerceError::not_found("Order", id))
    }

    #[instrument(skip(self))]
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order> {
        let mut order = self.find(id).await?;
        order.set_status(status);
        self.orders.update(&order).await?;
        self.publish(&mut order).await;
        info!("order status updated");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn update_payment_status(&self, id: &str, status: PaymentStatus) -> Result<Order> {
        let mut order = self.find(id).await?;
        order.set_payment_status(status);
        self.orders.update(&order).await?;
        self.publish(&mut order).await;
        info!("payment status updated");
        Ok(order)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Order>> {
        let mut orders = self.orders.list().await?;
        orders.reverse();
        Ok(orders)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Order>> {
        self.orders.get(id).await
    }

    pub async fn by_customer(&self, email: &str) -> Result<Vec<Order>> {
        let email = normalize_email(email);
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|o| normalize_email(&o.customer().email) == email)
            .collect())
    }

    pub async fn stats(&self) -> Result<OrderStats> {
        Ok(OrderStats::compute(&self.orders.list().await?))
    }

    pub async fn revenue_by_period(&self, period: RevenuePeriod) -> Result<Vec<RevenuePoint>> {
        Ok(revenue_by_period(&self.orders.list().await?, period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::fixtures::details;
    use crate::domain::aggregates::product::fixtures::{product, variant};
    use crate::domain::aggregates::{AnalyticsEvent, Customer, EventType, Segment};
    use crate::domain::events::fixtures::RecordingPublisher;
    use crate::domain::events::{DomainEvent, OrderEvent};
    use crate::domain::repositories::{AnalyticsRepository, CustomerRepository};
    use crate::domain::value_objects::Money;
    use chrono::{DateTime, Utc};
    use crate::infrastructure::MemoryStore;
    use crate::services::{Repositories, Storefront};
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    struct UnavailableCustomers;

    #[async_trait]
    impl CustomerRepository for UnavailableCustomers {
        async fn get(&self, _id: &str) -> Result<Option<Customer>> { Ok(None) }
        async fn by_email(&self, _email: &str) -> Result<Option<Customer>> { Ok(None) }
        async fn record_order(
            &self,
            _email: &str,
            _name: &str,
            _phone: Option<String>,
            _order_value: &Money,
            _now: DateTime<Utc>,
        ) -> Result<Customer> {
            Err(EcommerceError::Storage("customers offline".into()))
        }
        async fn put(&self, _customer: &Customer) -> Result<()> { Err(EcommerceError::Storage("customers offline".into())) }
        async fn list(&self) -> Result<Vec<Customer>> { Ok(vec![]) }
    }

    struct BrokenAnalytics;

    #[async_trait]
    impl AnalyticsRepository for BrokenAnalytics {
        async fn append(&self, _event: AnalyticsEvent, _retain: usize) -> Result<()> {
            Err(EcommerceError::Storage("event log offline".into()))
        }
        async fn events(&self) -> Result<Vec<AnalyticsEvent>> { Ok(vec![]) }
    }

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_catalog(
            vec![
                product(1, "Home", vec![variant("a", 5000, 3)]),
                product(2, "Home", vec![variant("b", 1200, 10)]),
            ],
            vec![],
        ))
    }

    fn storefront(store: Arc<MemoryStore>) -> (Storefront, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        (Storefront::new(Repositories::from_store(store), publisher.clone()), publisher)
    }

    #[tokio::test]
    async fn test_checkout_end_to_end() {
        let (shop, publisher) = storefront(store());
        let s = SessionId::new("s");
        let cart = shop.cart.add(&s, 1, "a", 2).await.unwrap();
        assert_eq!(cart.subtotal.amount(), Decimal::new(100, 0));
        assert!(cart.shipping.is_zero());

        let order = shop.orders.create_order(&s, details("ada@example.com")).await.unwrap();
        assert_eq!(order.total().amount(), Decimal::new(100, 0));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.customer_data().map(|c| c.segment), Some(Segment::New));

        let (_, v) = shop.catalog.get_variant(1, "a").await.unwrap();
        assert_eq!(v.stock(), 1);
        let log = shop.inventory.transactions(None).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, TransactionType::Out);
        assert_eq!((log[0].previous_stock, log[0].new_stock), (3, 1));
        assert_eq!(log[0].reason, format!("Order {}", order.id()));
        assert_eq!(log[0].reference.as_deref(), Some(order.id()));

        let customer = shop.customers.get_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(customer.total_orders, 1);
        assert_eq!(customer.total_spent.amount(), Decimal::new(100, 0));
        assert_eq!(customer.segment, Segment::New);

        assert!(shop.cart.get(&s).await.unwrap().is_empty());
        let report = shop.analytics.report().await.unwrap();
        assert_eq!(report.events_by_type.get(&EventType::CheckoutComplete), Some(&1));
        assert_eq!(shop.orders.get(order.id()).await.unwrap().unwrap().id(), order.id());
        assert!(publisher.events().iter().any(|e| matches!(e, DomainEvent::Order(OrderEvent::Placed { .. }))));
    }

    #[tokio::test]
    async fn test_checkout_rejections() {
        let (shop, _) = storefront(store());
        let s = SessionId::new("s");
        assert!(matches!(shop.orders.create_order(&s, details("ada@example.com")).await, Err(EcommerceError::EmptyCart)));

        shop.cart.add(&s, 2, "b", 1).await.unwrap();
        assert!(matches!(shop.orders.create_order(&s, details("nope")).await, Err(EcommerceError::Validation(_))));
        assert_eq!(shop.cart.get(&s).await.unwrap().item_count, 1);
    }

    #[tokio::test]
    async fn test_checkout_blocked_by_stock() {
        let store = store();
        let (shop, _) = storefront(store.clone());
        let s = SessionId::new("s");
        shop.cart.add(&s, 1, "a", 3).await.unwrap();
        shop.cart.add(&s, 2, "b", 1).await.unwrap();
        shop.inventory
            .record_transaction(TransactionRequest {
                product_id: 1, variant_id: "a".into(), kind: TransactionType::Adjustment,
                quantity: 1, reason: "recount".into(), reference: None,
            })
            .await
            .unwrap();

        match shop.orders.create_order(&s, details("ada@example.com")).await {
            Err(EcommerceError::StockValidation(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!((issues[0].requested, issues[0].available), (3, 1));
            }
            other => panic!("expected stock validation failure, got {other:?}"),
        }
        assert!(shop.orders.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_checkout_restores_stock() {
        let store = store();
        let publisher = Arc::new(RecordingPublisher::default());
        let repositories = Repositories { customers: Arc::new(UnavailableCustomers), ..Repositories::from_store(store) };
        let shop = Storefront::new(repositories, publisher);
        let s = SessionId::new("s");
        shop.cart.add(&s, 1, "a", 2).await.unwrap();
        shop.cart.add(&s, 2, "b", 4).await.unwrap();

        let err = shop.orders.create_order(&s, details("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Storage(_)));

        assert_eq!(shop.catalog.get_variant(1, "a").await.unwrap().1.stock(), 3);
        assert_eq!(shop.catalog.get_variant(2, "b").await.unwrap().1.stock(), 10);
        let log = shop.inventory.transactions(None).await.unwrap();
        assert_eq!(log.len(), 4);
        assert!(log[..2].iter().all(|t| t.kind == TransactionType::In && t.reason.ends_with("rolled back")));
        assert_eq!(shop.cart.get(&s).await.unwrap().item_count, 6);
        assert!(shop.orders.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_survives_failures_after_the_order_is_stored() {
        let store = store();
        let publisher = Arc::new(RecordingPublisher::default());
        let repositories = Repositories { analytics: Arc::new(BrokenAnalytics), ..Repositories::from_store(store) };
        let shop = Storefront::new(repositories, publisher.clone());
        let s = SessionId::new("s");
        shop.cart.add(&s, 1, "a", 1).await.unwrap();

        let order = shop.orders.create_order(&s, details("ada@example.com")).await.unwrap();
        assert_eq!(shop.orders.list().await.unwrap().len(), 1);
        assert_eq!(shop.catalog.get_variant(1, "a").await.unwrap().1.stock(), 2);
        assert!(shop.cart.get(&s).await.unwrap().is_empty());
        let placed: Vec<_> = publisher
            .events()
            .into_iter()
            .filter(|e| matches!(e, DomainEvent::Order(OrderEvent::Placed { .. })))
            .collect();
        assert_eq!(placed.len(), 1);
        assert!(matches!(&placed[0], DomainEvent::Order(OrderEvent::Placed { order_id, .. }) if order_id == order.id()));
    }

    #[tokio::test]
    async fn test_status_updates_and_queries() {
        let (shop, publisher) = storefront(store());
        let s = SessionId::new("s");
        shop.cart.add(&s, 2, "b", 1).await.unwrap();
        let first = shop.orders.create_order(&s, details("ada@example.com")).await.unwrap();
        shop.cart.add(&s, 2, "b", 2).await.unwrap();
        let second = shop.orders.create_order(&s, details("bo@example.com")).await.unwrap();

        let shipped = shop.orders.update_status(first.id(), OrderStatus::Shipped).await.unwrap();
        assert_eq!(shipped.status(), OrderStatus::Shipped);
        assert!(shipped.updated_at() >= first.updated_at());
        shop.orders.update_status(first.id(), OrderStatus::Pending).await.unwrap();
        shop.orders.update_payment_status(first.id(), PaymentStatus::Paid).await.unwrap();
        assert!(shop.orders.update_status("ORD-missing", OrderStatus::Shipped).await.unwrap_err().is_not_found());

        let ids: Vec<_> = shop.orders.list().await.unwrap().iter().map(|o| o.id().to_string()).collect();
        assert_eq!(ids, [second.id(), first.id()]);
        assert_eq!(shop.orders.by_customer("ADA@example.com").await.unwrap().len(), 1);
        assert_eq!(shop.orders.by_customer(" bo@EXAMPLE.com").await.unwrap().len(), 1);

        let stats = shop.orders.stats().await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_revenue, first.total().clone());
        assert_eq!(stats.pending_orders, 2);

        let revenue = shop.orders.revenue_by_period(RevenuePeriod::Month).await.unwrap();
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[0].orders, 1);

        let changes = publisher
            .events()
            .into_iter()
            .filter(|e| matches!(e, DomainEvent::Order(OrderEvent::StatusChanged { .. } | OrderEvent::PaymentStatusChanged { .. })))
            .count();
        assert_eq!(changes, 3);
    }
}
