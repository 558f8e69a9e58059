//! Repository traits for data access abstraction
//!
//! One trait per entity. Managers receive them as `Arc<dyn ...>` so the
//! backing store is chosen at start-up: [`MemoryStore`] for tests and local
//! runs, [`PgStore`] for production.
//!
//! Writes are single-record: a cart line, a wishlist entry, one order, one
//! customer. Counters that concurrent requests bump go through a
//! read-modify-write the store applies atomically: variant stock via
//! [`CatalogRepository::apply_stock_change`], cart quantities via
//! [`CartRepository::add_to_line`] and customer totals via
//! [`CustomerRepository::record_order`].
//!
//! [`MemoryStore`]: crate::infrastructure::memory::MemoryStore
//! [`PgStore`]: crate::infrastructure::postgres::PgStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::aggregates::{
    AbandonedCart, AnalyticsEvent, CartLine, Category, Customer, InventoryAlert,
    InventoryTransaction, Order, Product, StockChange, TransactionType, WishlistEntry,
};
use crate::domain::value_objects::{Money, SessionId};
use crate::Result;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All products ordered by id.
    async fn products(&self) -> Result<Vec<Product>>;

    async fn product(&self, id: u32) -> Result<Option<Product>>;

    async fn categories(&self) -> Result<Vec<Category>>;

    /// Applies `kind`/`quantity` to one variant's stock and returns the
    /// before/after levels. Fails with `NotFound` for an unknown variant.
    async fn apply_stock_change(
        &self,
        product_id: u32,
        variant_id: &str,
        kind: TransactionType,
        quantity: i64,
    ) -> Result<StockChange>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Lines in insertion order.
    async fn lines(&self, session: &SessionId) -> Result<Vec<CartLine>>;

    async fn line(&self, session: &SessionId, product_id: u32, variant_id: &str) -> Result<Option<CartLine>>;

    /// Inserts or replaces the line for `(line.product_id, line.variant_id)`.
    async fn put_line(&self, session: &SessionId, line: CartLine) -> Result<()>;

    /// Adds `quantity` to the line, capped at `stock`, and returns the new
    /// quantity. A result of zero leaves no line behind.
    async fn add_to_line(&self, session: &SessionId, product_id: u32, variant_id: &str, quantity: u32, stock: u32) -> Result<u32>;

    async fn delete_line(&self, session: &SessionId, product_id: u32, variant_id: &str) -> Result<()>;

    async fn clear(&self, session: &SessionId) -> Result<()>;

    async fn save_abandoned(&self, cart: AbandonedCart) -> Result<()>;

    async fn abandoned(&self) -> Result<Vec<AbandonedCart>>;
}

#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// Entries in insertion order.
    async fn entries(&self, session: &SessionId) -> Result<Vec<WishlistEntry>>;

    /// Returns `false` when an entry for the same product/variant exists.
    async fn insert(&self, session: &SessionId, entry: WishlistEntry) -> Result<bool>;

    /// Returns `false` when nothing matched.
    async fn remove(&self, session: &SessionId, product_id: u32, variant_id: Option<&str>) -> Result<bool>;

    async fn clear(&self, session: &SessionId) -> Result<()>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Appends to the transaction log, keeping only the newest `retain`.
    async fn append_transaction(&self, transaction: InventoryTransaction, retain: usize) -> Result<()>;

    /// Up to `limit` transactions, newest first.
    async fn recent_transactions(&self, limit: usize) -> Result<Vec<InventoryTransaction>>;

    /// Stores `alert` unless an unacknowledged alert of the same kind exists
    /// for the same variant. Returns whether it was stored.
    async fn insert_alert_if_new(&self, alert: InventoryAlert) -> Result<bool>;

    /// All alerts, newest first.
    async fn alerts(&self) -> Result<Vec<InventoryAlert>>;

    /// Returns `false` for an unknown or already acknowledged alert.
    async fn acknowledge_alert(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Replaces the stored order with the same id.
    async fn update(&self, order: &Order) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<Order>>;

    /// All orders, oldest first.
    async fn list(&self) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Customer>>;

    async fn by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Folds one order into the profile for `email`, creating it on first
    /// purchase. `email` is expected in normalized form.
    async fn record_order(
        &self,
        email: &str,
        name: &str,
        phone: Option<String>,
        order_value: &Money,
        now: DateTime<Utc>,
    ) -> Result<Customer>;

    /// Inserts or replaces by id.
    async fn put(&self, customer: &Customer) -> Result<()>;

    async fn list(&self) -> Result<Vec<Customer>>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Appends to the event log, keeping only the newest `retain`.
    async fn append(&self, event: AnalyticsEvent, retain: usize) -> Result<()>;

    /// All retained events, oldest first.
    async fn events(&self) -> Result<Vec<AnalyticsEvent>>;
}
