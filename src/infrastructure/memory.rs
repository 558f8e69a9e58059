//! In-memory store
//!
//! Every collection sits behind its own `tokio::sync::RwLock`. Used by the
//! test suite and by the binary when no `DATABASE_URL` is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tokio::sync::RwLock;
use crate::domain::aggregates::cart::clamp_to_stock;
use crate::domain::aggregates::{
    AbandonedCart, AnalyticsEvent, CartLine, Category, Customer, InventoryAlert,
    InventoryTransaction, Order, Product, StockChange, TransactionType, WishlistEntry,
};
use crate::domain::repositories::{
    AnalyticsRepository, CartRepository, CatalogRepository, CustomerRepository,
    InventoryRepository, OrderRepository, WishlistRepository,
};
use crate::domain::value_objects::{Money, SessionId};
use crate::infrastructure::seed;
use crate::{EcommerceError, Result};

#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<BTreeMap<u32, Product>>,
    categories: RwLock<Vec<Category>>,
    carts: RwLock<HashMap<SessionId, Vec<CartLine>>>,
    abandoned: RwLock<Vec<AbandonedCart>>,
    wishlists: RwLock<HashMap<SessionId, Vec<WishlistEntry>>>,
    transactions: RwLock<VecDeque<InventoryTransaction>>,
    alerts: RwLock<Vec<InventoryAlert>>,
    orders: RwLock<Vec<Order>>,
    customers: RwLock<Vec<Customer>>,
    events: RwLock<VecDeque<AnalyticsEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_catalog(products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self {
            products: RwLock::new(products.into_iter().map(|p| (p.id, p)).collect()),
            categories: RwLock::new(categories),
            ..Self::default()
        }
    }

    /// Store preloaded with the demo catalog.
    pub fn seeded() -> Result<Self> {
        let products = seed::demo_products()?;
        let categories = seed::demo_categories(&products);
        Ok(Self::with_catalog(products, categories))
    }
}

fn trim_front<T>(log: &mut VecDeque<T>, retain: usize) {
    while log.len() > retain {
        log.pop_front();
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn product(&self, id: u32) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.read().await.clone())
    }

    async fn apply_stock_change(&self, product_id: u32, variant_id: &str, kind: TransactionType, quantity: i64) -> Result<StockChange> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&product_id)
            .ok_or_else(|| EcommerceError::not_found("Product", product_id))?;
        let product_name = product.name.clone();
        let variant = product
            .variant_mut(variant_id)
            .ok_or_else(|| EcommerceError::variant_not_found(product_id, variant_id))?;
        let previous_stock = variant.stock();
        let new_stock = kind.apply(previous_stock, quantity);
        variant.set_stock(new_stock);
        Ok(StockChange {
            product_id,
            product_name,
            variant_id: variant.id.clone(),
            variant_name: variant.name.clone(),
            previous_stock,
            new_stock,
        })
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn lines(&self, session: &SessionId) -> Result<Vec<CartLine>> {
        Ok(self.carts.read().await.get(session).cloned().unwrap_or_default())
    }

    async fn line(&self, session: &SessionId, product_id: u32, variant_id: &str) -> Result<Option<CartLine>> {
        let carts = self.carts.read().await;
        Ok(carts
            .get(session)
            .and_then(|lines| lines.iter().find(|l| l.is_for(product_id, variant_id)).cloned()))
    }

    async fn put_line(&self, session: &SessionId, line: CartLine) -> Result<()> {
        let mut carts = self.carts.write().await;
        let lines = carts.entry(session.clone()).or_default();
        match lines.iter_mut().find(|l| l.is_for(line.product_id, &line.variant_id)) {
            Some(existing) => *existing = line,
            None => lines.push(line),
        }
        Ok(())
    }

    async fn add_to_line(&self, session: &SessionId, product_id: u32, variant_id: &str, quantity: u32, stock: u32) -> Result<u32> {
        let mut carts = self.carts.write().await;
        let lines = carts.entry(session.clone()).or_default();
        let position = lines.iter().position(|l| l.is_for(product_id, variant_id));
        let next = clamp_to_stock(position.map_or(0, |i| lines[i].quantity), quantity, stock);
        match position {
            Some(i) if next == 0 => {
                lines.remove(i);
            }
            Some(i) => lines[i].quantity = next,
            None if next > 0 => lines.push(CartLine::new(product_id, variant_id, next)),
            None => {}
        }
        Ok(next)
    }

    async fn delete_line(&self, session: &SessionId, product_id: u32, variant_id: &str) -> Result<()> {
        if let Some(lines) = self.carts.write().await.get_mut(session) {
            lines.retain(|l| !l.is_for(product_id, variant_id));
        }
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<()> {
        self.carts.write().await.remove(session);
        Ok(())
    }

    async fn save_abandoned(&self, cart: AbandonedCart) -> Result<()> {
        self.abandoned.write().await.push(cart);
        Ok(())
    }

    async fn abandoned(&self) -> Result<Vec<AbandonedCart>> {
        Ok(self.abandoned.read().await.clone())
    }
}

#[async_trait]
impl WishlistRepository for MemoryStore {
    async fn entries(&self, session: &SessionId) -> Result<Vec<WishlistEntry>> {
        Ok(self.wishlists.read().await.get(session).cloned().unwrap_or_default())
    }

    async fn insert(&self, session: &SessionId, entry: WishlistEntry) -> Result<bool> {
        let mut wishlists = self.wishlists.write().await;
        let entries = wishlists.entry(session.clone()).or_default();
        if entries.iter().any(|e| e.is_for(entry.product_id, entry.variant_id.as_deref())) {
            return Ok(false);
        }
        entries.push(entry);
        Ok(true)
    }

    async fn remove(&self, session: &SessionId, product_id: u32, variant_id: Option<&str>) -> Result<bool> {
        let mut wishlists = self.wishlists.write().await;
        let Some(entries) = wishlists.get_mut(session) else { return Ok(false) };
        let before = entries.len();
        entries.retain(|e| !e.is_for(product_id, variant_id));
        Ok(entries.len() != before)
    }

    async fn clear(&self, session: &SessionId) -> Result<()> {
        self.wishlists.write().await.remove(session);
        Ok(())
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn append_transaction(&self, transaction: InventoryTransaction, retain: usize) -> Result<()> {
        let mut log = self.transactions.write().await;
        log.push_back(transaction);
        trim_front(&mut log, retain);
        Ok(())
    }

    async fn recent_transactions(&self, limit: usize) -> Result<Vec<InventoryTransaction>> {
        Ok(self.transactions.read().await.iter().rev().take(limit).cloned().collect())
    }

    async fn insert_alert_if_new(&self, alert: InventoryAlert) -> Result<bool> {
        let mut alerts = self.alerts.write().await;
        if alerts.iter().any(|open| alert.duplicates(open)) {
            return Ok(false);
        }
        alerts.push(alert);
        Ok(true)
    }

    async fn alerts(&self) -> Result<Vec<InventoryAlert>> {
        Ok(self.alerts.read().await.iter().rev().cloned().collect())
    }

    async fn acknowledge_alert(&self, id: &str) -> Result<bool> {
        let mut alerts = self.alerts.write().await;
        match alerts.iter_mut().find(|a| a.id == id && !a.acknowledged) {
            Some(alert) => {
                alert.acknowledged = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .iter_mut()
            .find(|o| o.id() == order.id())
            .ok_or_else(|| EcommerceError::not_found("Order", order.id()))?;
        *stored = order.clone();
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Order>> {
        Ok(self.orders.read().await.iter().find(|o| o.id() == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        Ok(self.orders.read().await.clone())
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn by_email(&self, email: &str) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.iter().find(|c| c.email == email).cloned())
    }

    async fn record_order(
        &self,
        email: &str,
        name: &str,
        phone: Option<String>,
        order_value: &Money,
        now: DateTime<Utc>,
    ) -> Result<Customer> {
        let mut customers = self.customers.write().await;
        match customers.iter_mut().find(|c| c.email == email) {
            Some(existing) => {
                existing.record_order(name, phone, order_value, now)?;
                Ok(existing.clone())
            }
            None => {
                let created = Customer::first_order(email, name, phone, order_value.clone(), now);
                customers.push(created.clone());
                Ok(created)
            }
        }
    }

    async fn put(&self, customer: &Customer) -> Result<()> {
        let mut customers = self.customers.write().await;
        match customers.iter_mut().find(|c| c.id == customer.id) {
            Some(existing) => *existing = customer.clone(),
            None => customers.push(customer.clone()),
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Customer>> {
        Ok(self.customers.read().await.clone())
    }
}

#[async_trait]
impl AnalyticsRepository for MemoryStore {
    async fn append(&self, event: AnalyticsEvent, retain: usize) -> Result<()> {
        let mut log = self.events.write().await;
        log.push_back(event);
        trim_front(&mut log, retain);
        Ok(())
    }

    async fn events(&self) -> Result<Vec<AnalyticsEvent>> {
        Ok(self.events.read().await.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::analytics::{EventData, EventType};
    use crate::domain::aggregates::product::fixtures::{product, variant};

    fn store() -> MemoryStore {
        MemoryStore::with_catalog(vec![product(1, "Home", vec![variant("a", 1000, 3)])], vec![])
    }

    #[tokio::test]
    async fn test_stock_change_is_floored() {
        let store = store();
        let change = store.apply_stock_change(1, "a", TransactionType::Out, 5).await.unwrap();
        assert_eq!((change.previous_stock, change.new_stock), (3, 0));
        let again = store.apply_stock_change(1, "a", TransactionType::Out, 1).await.unwrap();
        assert_eq!((again.previous_stock, again.new_stock), (0, 0));
        let err = store.apply_stock_change(1, "zz", TransactionType::In, 1).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_line_replaces_in_place() {
        let store = store();
        let session = SessionId::new("s");
        store.put_line(&session, CartLine::new(1, "a", 1)).await.unwrap();
        store.put_line(&session, CartLine::new(2, "b", 1)).await.unwrap();
        store.put_line(&session, CartLine::new(1, "a", 3)).await.unwrap();
        let lines = store.lines(&session).await.unwrap();
        assert_eq!(lines, vec![CartLine::new(1, "a", 3), CartLine::new(2, "b", 1)]);
        assert!(store.lines(&SessionId::new("other")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_to_line_clamps_under_one_lock() {
        let store = store();
        let session = SessionId::new("s");
        let carts: &dyn CartRepository = &store;
        assert_eq!(carts.add_to_line(&session, 1, "a", 2, 3).await.unwrap(), 2);
        assert_eq!(carts.add_to_line(&session, 1, "a", 2, 3).await.unwrap(), 3);
        assert_eq!(carts.add_to_line(&session, 1, "a", 1, 0).await.unwrap(), 0);
        assert!(carts.lines(&session).await.unwrap().is_empty());
        assert_eq!(carts.add_to_line(&session, 2, "b", 4, 0).await.unwrap(), 0);
        assert!(carts.lines(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_order_creates_then_accumulates() {
        let store = MemoryStore::new();
        let customers: &dyn CustomerRepository = &store;
        let now = Utc::now();
        let first = customers.record_order("ada@example.com", "Ada", None, &Money::cents(1000), now).await.unwrap();
        let second = customers.record_order("ada@example.com", "Ada", None, &Money::cents(500), now).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.total_orders, 2);
        assert_eq!(second.total_spent, Money::cents(1500));
        assert_eq!(customers.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_event_log_keeps_newest() {
        let store = MemoryStore::new();
        for i in 0..5 {
            let mut data = EventData::new();
            data.insert("i".into(), i.into());
            store.append(AnalyticsEvent::new(SessionId::new("s"), EventType::PageView, data), 3).await.unwrap();
        }
        let events = store.events().await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].data["i"], 2);
        assert_eq!(events[2].data["i"], 4);
    }

    #[tokio::test]
    async fn test_wishlist_insert_is_idempotent() {
        let store = MemoryStore::new();
        let session = SessionId::new("s");
        let wishlist: &dyn WishlistRepository = &store;
        assert!(wishlist.insert(&session, WishlistEntry::new(1, None)).await.unwrap());
        assert!(!wishlist.insert(&session, WishlistEntry::new(1, None)).await.unwrap());
        assert!(wishlist.insert(&session, WishlistEntry::new(1, Some("a".into()))).await.unwrap());
        assert!(wishlist.remove(&session, 1, None).await.unwrap());
        assert!(!wishlist.remove(&session, 1, None).await.unwrap());
        assert_eq!(wishlist.entries(&session).await.unwrap().len(), 1);
    }
}
