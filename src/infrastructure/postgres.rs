//! PostgreSQL store
//!
//! Aggregates are kept as JSONB documents next to the few columns the
//! queries filter on. A document that no longer decodes is logged and
//! skipped, so a bad row reads as absent rather than failing the request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::{info, warn};
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

#[derive(Clone)]
pub struct PgStore { pool: PgPool }

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| EcommerceError::Storage(e.to_string()))
    }

    /// Loads the demo catalog. Rows already present are left untouched, so
    /// stock levels survive a restart.
    pub async fn seed_catalog(&self) -> Result<()> {
        let products = seed::demo_products()?;
        let categories = seed::demo_categories(&products);
        let mut tx = self.pool.begin().await?;
        for product in &products {
            sqlx::query("INSERT INTO products (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
                .bind(int(product.id, "product id")?)
                .bind(Json(product))
                .execute(&mut *tx)
                .await?;
        }
        for (position, category) in categories.iter().enumerate() {
            sqlx::query("INSERT INTO categories (id, position, doc) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING")
                .bind(&category.id)
                .bind(int(position, "category position")?)
                .bind(Json(category))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!(products = products.len(), categories = categories.len(), "catalog seeded");
        Ok(())
    }

    async fn docs<T: DeserializeOwned>(&self, sql: &str, what: &'static str) -> Result<Vec<T>> {
        let rows: Vec<(Value,)> = sqlx::query_as(sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().filter_map(|(doc,)| decode(doc, what)).collect())
    }

    async fn doc_by_id<T: DeserializeOwned>(&self, sql: &str, id: &str, what: &'static str) -> Result<Option<T>> {
        let row: Option<(Value,)> = sqlx::query_as(sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.and_then(|(doc,)| decode(doc, what)))
    }
}

/// INTEGER columns are signed; values past `i32::MAX` are rejected, not wrapped.
fn int(value: impl TryInto<i32> + Copy + std::fmt::Display, what: &'static str) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| EcommerceError::Validation(format!("{what} out of range: {value}")))
}

fn decode<T: DeserializeOwned>(doc: Value, what: &'static str) -> Option<T> {
    match serde_json::from_value(doc) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, what, "skipping undecodable document");
            None
        }
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn products(&self) -> Result<Vec<Product>> {
        self.docs("SELECT doc FROM products ORDER BY id", "product").await
    }

    async fn product(&self, id: u32) -> Result<Option<Product>> {
        let row: Option<(Value,)> = sqlx::query_as("SELECT doc FROM products WHERE id = $1")
            .bind(int(id, "product id")?)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|(doc,)| decode(doc, "product")))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        self.docs("SELECT doc FROM categories ORDER BY position", "category").await
    }

    async fn apply_stock_change(&self, product_id: u32, variant_id: &str, kind: TransactionType, quantity: i64) -> Result<StockChange> {
        let mut tx = self.pool.begin().await?;
        let row: Option<(Value,)> = sqlx::query_as("SELECT doc FROM products WHERE id = $1 FOR UPDATE")
            .bind(int(product_id, "product id")?)
            .fetch_optional(&mut *tx)
            .await?;
        let mut product: Product = row
            .and_then(|(doc,)| decode(doc, "product"))
            .ok_or_else(|| EcommerceError::not_found("Product", product_id))?;
        let product_name = product.name.clone();
        let variant = product
            .variant_mut(variant_id)
            .ok_or_else(|| EcommerceError::variant_not_found(product_id, variant_id))?;
        let previous_stock = variant.stock();
        let new_stock = kind.apply(previous_stock, quantity);
        variant.set_stock(new_stock);
        let change = StockChange {
            product_id,
            product_name,
            variant_id: variant.id.clone(),
            variant_name: variant.name.clone(),
            previous_stock,
            new_stock,
        };
        sqlx::query("UPDATE products SET doc = $2, updated_at = NOW() WHERE id = $1")
            .bind(int(product_id, "product id")?)
            .bind(Json(&product))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(change)
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn lines(&self, session: &SessionId) -> Result<Vec<CartLine>> {
        let rows: Vec<(i32, String, i32)> = sqlx::query_as(
            "SELECT product_id, variant_id, quantity FROM cart_lines WHERE session_id = $1 ORDER BY seq",
        )
        .bind(session.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(product_id, variant_id, quantity)| CartLine::new(product_id as u32, variant_id, quantity as u32))
            .collect())
    }

    async fn line(&self, session: &SessionId, product_id: u32, variant_id: &str) -> Result<Option<CartLine>> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT quantity FROM cart_lines WHERE session_id = $1 AND product_id = $2 AND variant_id = $3",
        )
        .bind(session.as_str())
        .bind(int(product_id, "product id")?)
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(quantity,)| CartLine::new(product_id, variant_id, quantity as u32)))
    }

    async fn put_line(&self, session: &SessionId, line: CartLine) -> Result<()> {
        sqlx::query(
            "INSERT INTO cart_lines (session_id, product_id, variant_id, quantity) VALUES ($1, $2, $3, $4)
             ON CONFLICT (session_id, product_id, variant_id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(session.as_str())
        .bind(int(line.product_id, "product id")?)
        .bind(&line.variant_id)
        .bind(int(line.quantity, "quantity")?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_to_line(&self, session: &SessionId, product_id: u32, variant_id: &str, quantity: u32, stock: u32) -> Result<u32> {
        if stock == 0 {
            self.delete_line(session, product_id, variant_id).await?;
            return Ok(0);
        }
        let row: Option<(i32,)> = if quantity == 0 {
            sqlx::query_as(
                "UPDATE cart_lines SET quantity = LEAST(quantity, $4)
                 WHERE session_id = $1 AND product_id = $2 AND variant_id = $3
                 RETURNING quantity",
            )
            .bind(session.as_str())
            .bind(int(product_id, "product id")?)
            .bind(variant_id)
            .bind(int(stock, "stock")?)
            .fetch_optional(&self.pool)
            .await?
        } else {
            // The row lock taken by ON CONFLICT serializes concurrent adds.
            sqlx::query_as(
                "INSERT INTO cart_lines (session_id, product_id, variant_id, quantity) VALUES ($1, $2, $3, LEAST($4, $5))
                 ON CONFLICT (session_id, product_id, variant_id)
                 DO UPDATE SET quantity = LEAST(cart_lines.quantity::BIGINT + $4, $5)
                 RETURNING quantity",
            )
            .bind(session.as_str())
            .bind(int(product_id, "product id")?)
            .bind(variant_id)
            .bind(i64::from(quantity))
            .bind(i64::from(int(stock, "stock")?))
            .fetch_optional(&self.pool)
            .await?
        };
        Ok(row.map_or(0, |(quantity,)| quantity.unsigned_abs()))
    }

    async fn delete_line(&self, session: &SessionId, product_id: u32, variant_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE session_id = $1 AND product_id = $2 AND variant_id = $3")
            .bind(session.as_str())
            .bind(int(product_id, "product id")?)
            .bind(variant_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE session_id = $1")
            .bind(session.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_abandoned(&self, cart: AbandonedCart) -> Result<()> {
        sqlx::query("INSERT INTO abandoned_carts (id, doc, created_at) VALUES ($1, $2, $3)")
            .bind(&cart.id)
            .bind(Json(&cart))
            .bind(cart.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn abandoned(&self) -> Result<Vec<AbandonedCart>> {
        self.docs("SELECT doc FROM abandoned_carts ORDER BY seq", "abandoned cart").await
    }
}

#[async_trait]
impl WishlistRepository for PgStore {
    async fn entries(&self, session: &SessionId) -> Result<Vec<WishlistEntry>> {
        let rows: Vec<(i32, Option<String>, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
            "SELECT product_id, variant_id, added_at FROM wishlist_entries WHERE session_id = $1 ORDER BY seq",
        )
        .bind(session.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(product_id, variant_id, added_at)| WishlistEntry { product_id: product_id as u32, variant_id, added_at })
            .collect())
    }

    async fn insert(&self, session: &SessionId, entry: WishlistEntry) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO wishlist_entries (session_id, product_id, variant_id, added_at) VALUES ($1, $2, $3, $4)
             ON CONFLICT DO NOTHING",
        )
        .bind(session.as_str())
        .bind(int(entry.product_id, "product id")?)
        .bind(&entry.variant_id)
        .bind(entry.added_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, session: &SessionId, product_id: u32, variant_id: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM wishlist_entries
             WHERE session_id = $1 AND product_id = $2 AND COALESCE(variant_id, '') = COALESCE($3, '')",
        )
        .bind(session.as_str())
        .bind(int(product_id, "product id")?)
        .bind(variant_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, session: &SessionId) -> Result<()> {
        sqlx::query("DELETE FROM wishlist_entries WHERE session_id = $1")
            .bind(session.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryRepository for PgStore {
    async fn append_transaction(&self, transaction: InventoryTransaction, retain: usize) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO inventory_transactions (id, doc) VALUES ($1, $2)")
            .bind(&transaction.id)
            .bind(Json(&transaction))
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM inventory_transactions
             WHERE seq NOT IN (SELECT seq FROM inventory_transactions ORDER BY seq DESC LIMIT $1)",
        )
        .bind(i64::try_from(retain).unwrap_or(i64::MAX))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn recent_transactions(&self, limit: usize) -> Result<Vec<InventoryTransaction>> {
        let rows: Vec<(Value,)> = sqlx::query_as("SELECT doc FROM inventory_transactions ORDER BY seq DESC LIMIT $1")
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().filter_map(|(doc,)| decode(doc, "inventory transaction")).collect())
    }

    async fn insert_alert_if_new(&self, alert: InventoryAlert) -> Result<bool> {
        let kind = serde_json::to_value(alert.kind)?;
        let result = sqlx::query(
            "INSERT INTO inventory_alerts (id, variant_id, kind, acknowledged, doc) VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT DO NOTHING",
        )
        .bind(&alert.id)
        .bind(&alert.variant_id)
        .bind(kind.as_str().unwrap_or_default())
        .bind(alert.acknowledged)
        .bind(Json(&alert))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn alerts(&self) -> Result<Vec<InventoryAlert>> {
        self.docs("SELECT doc FROM inventory_alerts ORDER BY seq DESC", "inventory alert").await
    }

    async fn acknowledge_alert(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE inventory_alerts
             SET acknowledged = TRUE, doc = jsonb_set(doc, '{acknowledged}', 'true'::jsonb)
             WHERE id = $1 AND NOT acknowledged",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        sqlx::query("INSERT INTO orders (id, email, doc, created_at) VALUES ($1, $2, $3, $4)")
            .bind(order.id())
            .bind(&order.customer().email)
            .bind(Json(order))
            .bind(order.created_at())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET doc = $2 WHERE id = $1")
            .bind(order.id())
            .bind(Json(order))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(EcommerceError::not_found("Order", order.id()));
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Order>> {
        self.doc_by_id("SELECT doc FROM orders WHERE id = $1", id, "order").await
    }

    async fn list(&self) -> Result<Vec<Order>> {
        self.docs("SELECT doc FROM orders ORDER BY seq", "order").await
    }
}

#[async_trait]
impl CustomerRepository for PgStore {
    async fn get(&self, id: &str) -> Result<Option<Customer>> {
        self.doc_by_id("SELECT doc FROM customers WHERE id = $1", id, "customer").await
    }

    async fn by_email(&self, email: &str) -> Result<Option<Customer>> {
        self.doc_by_id("SELECT doc FROM customers WHERE email = $1", email, "customer").await
    }

    async fn record_order(
        &self,
        email: &str,
        name: &str,
        phone: Option<String>,
        order_value: &Money,
        now: DateTime<Utc>,
    ) -> Result<Customer> {
        let mut tx = self.pool.begin().await?;
        let created = Customer::first_order(email, name, phone.clone(), order_value.clone(), now);
        let inserted = sqlx::query("INSERT INTO customers (id, email, doc) VALUES ($1, $2, $3) ON CONFLICT (email) DO NOTHING")
            .bind(&created.id)
            .bind(&created.email)
            .bind(Json(&created))
            .execute(&mut *tx)
            .await?;
        if inserted.rows_affected() == 1 {
            tx.commit().await?;
            return Ok(created);
        }

        let row: Option<(Value,)> = sqlx::query_as("SELECT doc FROM customers WHERE email = $1 FOR UPDATE")
            .bind(&created.email)
            .fetch_optional(&mut *tx)
            .await?;
        let mut customer: Customer = row
            .and_then(|(doc,)| decode(doc, "customer"))
            .ok_or_else(|| EcommerceError::not_found("Customer", email))?;
        customer.record_order(name, phone, order_value, now)?;
        sqlx::query("UPDATE customers SET doc = $2 WHERE id = $1")
            .bind(&customer.id)
            .bind(Json(&customer))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(customer)
    }

    async fn put(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            "INSERT INTO customers (id, email, doc) VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, doc = EXCLUDED.doc",
        )
        .bind(&customer.id)
        .bind(&customer.email)
        .bind(Json(customer))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Customer>> {
        self.docs("SELECT doc FROM customers", "customer").await
    }
}

#[async_trait]
impl AnalyticsRepository for PgStore {
    async fn append(&self, event: AnalyticsEvent, retain: usize) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO analytics_events (id, doc) VALUES ($1, $2)")
            .bind(&event.id)
            .bind(Json(&event))
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM analytics_events
             WHERE seq NOT IN (SELECT seq FROM analytics_events ORDER BY seq DESC LIMIT $1)",
        )
        .bind(i64::try_from(retain).unwrap_or(i64::MAX))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn events(&self) -> Result<Vec<AnalyticsEvent>> {
        self.docs("SELECT doc FROM analytics_events ORDER BY seq", "analytics event").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bad_document_reads_as_absent() {
        assert!(decode::<Customer>(json!({"id": 3}), "customer").is_none());
        let line: Option<CartLine> = decode(json!({"productId": 1, "variantId": "var-1", "quantity": 2}), "cart line");
        assert_eq!(line, Some(CartLine::new(1, "var-1", 2)));
    }

    #[test]
    fn test_integer_columns_reject_overflow() {
        assert_eq!(int(7u32, "product id").unwrap(), 7);
        assert_eq!(int(i32::MAX as u32, "quantity").unwrap(), i32::MAX);
        let err = int(u32::MAX, "product id").unwrap_err();
        assert!(matches!(&err, EcommerceError::Validation(msg) if msg == "product id out of range: 4294967295"));
        assert!(int(usize::MAX, "category position").is_err());
    }
}
