//! Order Aggregate
//!
//! Line items snapshot names and prices at checkout so historical orders do
//! not move with the catalog. After creation only `status` and
//! `payment_status` change, and any value may follow any other.

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;
use crate::domain::aggregates::cart::{Cart, CartItem};
use crate::domain::aggregates::customer::Customer;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{prefixed_id, Money, STORE_CURRENCY};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    items: Vec<OrderItem>,
    subtotal: Money,
    shipping: Money,
    total: Money,
    customer: Contact,
    shipping_address: ShippingAddress,
    status: OrderStatus,
    payment_status: PaymentStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    customer_data: Option<Customer>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: u32,
    pub product_name: String,
    pub variant_id: String,
    pub variant_name: String,
    pub quantity: u32,
    pub price: Money,
    pub image: String,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            variant_id: item.variant_id.clone(),
            variant_name: item.variant_name.clone(),
            quantity: item.quantity,
            price: item.unit_price.clone(),
            image: item.image.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Contact {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 40))]
    pub phone: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub zip: String,
    #[validate(length(min = 1))]
    pub country: String,
}

/// Everything checkout needs besides the cart itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    #[validate]
    pub customer: Contact,
    #[validate]
    pub shipping_address: ShippingAddress,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled, Refunded }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Refunded }

impl Order {
    /// Freezes `cart` into a pending order. Callers guarantee the cart is non-empty.
    pub fn place(cart: &Cart, details: CheckoutDetails) -> Self {
        let id = prefixed_id("ORD");
        let now = Utc::now();
        let mut order = Self {
            id: id.clone(),
            items: cart.items.iter().map(OrderItem::from).collect(),
            subtotal: cart.subtotal.clone(),
            shipping: cart.shipping.clone(),
            total: cart.total.clone(),
            customer: details.customer,
            shipping_address: details.shipping_address,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            notes: details.notes,
            created_at: now, updated_at: now,
            customer_data: None,
            events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: id, email: order.customer.email.clone(), total: order.total.amount(),
        }));
        order
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn shipping(&self) -> &Money { &self.shipping }
    pub fn total(&self) -> &Money { &self.total }
    pub fn customer(&self) -> &Contact { &self.customer }
    pub fn shipping_address(&self) -> &ShippingAddress { &self.shipping_address }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn customer_data(&self) -> Option<&Customer> { self.customer_data.as_ref() }
    pub fn is_paid(&self) -> bool { self.payment_status == PaymentStatus::Paid }

    pub fn attach_customer(&mut self, customer: Customer) { self.customer_data = Some(customer); }

    pub fn set_status(&mut self, status: OrderStatus) {
        let from = self.status;
        self.status = status;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id.clone(), from, to: status }));
    }

    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        let from = self.payment_status;
        self.payment_status = status;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::PaymentStatusChanged { order_id: self.id.clone(), from, to: status }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    pub total_revenue: Money,
    pub average_order_value: Money,
    pub pending_orders: usize,
    pub processing_orders: usize,
    pub shipped_orders: usize,
    pub delivered_orders: usize,
    pub cancelled_orders: usize,
    pub refunded_orders: usize,
    pub recent_orders: Vec<Order>,
}

impl OrderStats {
    /// `orders` in creation order, oldest first.
    pub fn compute(orders: &[Order]) -> Self {
        let revenue: Decimal = orders.iter().filter(|o| o.is_paid()).map(|o| o.total.amount()).sum();
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();
        Self {
            total_orders: orders.len(),
            total_revenue: Money::usd(revenue),
            // Revenue counts paid orders only but is averaged over all of them.
            average_order_value: Money::usd(revenue).average(orders.len()),
            pending_orders: count(OrderStatus::Pending),
            processing_orders: count(OrderStatus::Processing),
            shipped_orders: count(OrderStatus::Shipped),
            delivered_orders: count(OrderStatus::Delivered),
            cancelled_orders: count(OrderStatus::Cancelled),
            refunded_orders: count(OrderStatus::Refunded),
            recent_orders: orders.iter().rev().take(5).cloned().collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenuePeriod { Day, Week, Month }

impl RevenuePeriod {
    /// Bucket key for `at`: `YYYY-MM-DD` for days, the Sunday opening the
    /// week for weeks, `YYYY-MM` for months.
    pub fn key(self, at: DateTime<Utc>) -> String {
        let date = at.date_naive();
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let start = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
                start.format("%Y-%m-%d").to_string()
            }
            Self::Month => format!("{}-{:02}", date.year(), date.month()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenuePoint { pub date: String, pub revenue: Decimal, pub orders: usize }

pub fn revenue_by_period(orders: &[Order], period: RevenuePeriod) -> Vec<RevenuePoint> {
    let mut grouped: BTreeMap<String, (Decimal, usize)> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.is_paid()) {
        let bucket = grouped.entry(period.key(order.created_at)).or_default();
        bucket.0 += order.total.amount();
        bucket.1 += 1;
    }
    grouped
        .into_iter()
        .map(|(date, (revenue, orders))| RevenuePoint { date, revenue, orders })
        .collect()
}

impl Default for Order {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(), items: vec![], subtotal: Money::zero(STORE_CURRENCY),
            shipping: Money::zero(STORE_CURRENCY), total: Money::zero(STORE_CURRENCY),
            customer: Contact::default(), shipping_address: ShippingAddress::default(),
            status: OrderStatus::default(), payment_status: PaymentStatus::default(), notes: None,
            created_at: now, updated_at: now, customer_data: None, events: vec![],
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn details(email: &str) -> CheckoutDetails {
        CheckoutDetails {
            customer: Contact { email: email.into(), name: "Ada Lovelace".into(), phone: "555-0100".into() },
            shipping_address: ShippingAddress {
                address: "1 Analytical Way".into(), city: "London".into(), state: "LDN".into(),
                zip: "N1 9GU".into(), country: "UK".into(),
            },
            notes: None,
        }
    }

    pub fn order_at(total_cents: i64, paid: bool, created_at: DateTime<Utc>) -> Order {
        let mut order = Order {
            id: prefixed_id("ORD"), total: Money::cents(total_cents), created_at,
            ..Order::default()
        };
        if paid { order.payment_status = PaymentStatus::Paid; }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::domain::aggregates::cart::CartItem;
    use crate::domain::aggregates::product::fixtures::{product, variant};
    use chrono::TimeZone;

    #[test]
    fn test_place_snapshots_cart() {
        let p = product(1, "Home", vec![variant("a", 5000, 3)]);
        let cart = Cart::from_items(vec![CartItem::new(&p, &p.variants[0], 2)]).unwrap();
        let mut order = Order::place(&cart, details("ada@example.com"));
        assert!(order.id().starts_with("ORD-"));
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.items()[0].price.amount(), Decimal::new(5000, 2));
        assert_eq!(order.total().amount(), Decimal::new(100, 0));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert!(matches!(order.take_events().as_slice(), [DomainEvent::Order(OrderEvent::Placed { .. })]));
    }

    #[test]
    fn test_any_status_may_follow_any_other() {
        let mut order = order_at(1000, false, Utc::now());
        order.set_status(OrderStatus::Delivered);
        order.set_status(OrderStatus::Pending);
        order.set_payment_status(PaymentStatus::Refunded);
        order.set_payment_status(PaymentStatus::Paid);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.is_paid());
        assert_eq!(order.take_events().len(), 4);
    }

    #[test]
    fn test_checkout_details_validation() {
        assert!(details("ada@example.com").validate().is_ok());
        assert!(details("not-an-email").validate().is_err());
        let mut missing_city = details("ada@example.com");
        missing_city.shipping_address.city.clear();
        assert!(missing_city.validate().is_err());
    }

    #[test]
    fn test_stats_count_paid_revenue_only() {
        let now = Utc::now();
        let mut shipped = order_at(10000, true, now);
        shipped.set_status(OrderStatus::Shipped);
        let orders = vec![shipped, order_at(5000, false, now), order_at(2000, true, now)];
        let stats = OrderStats::compute(&orders);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_revenue.amount(), Decimal::new(120, 0));
        assert_eq!(stats.average_order_value.amount(), Decimal::new(40, 0));
        assert_eq!(stats.pending_orders, 2);
        assert_eq!(stats.shipped_orders, 1);
        assert_eq!(stats.recent_orders[0].total().amount(), Decimal::new(20, 0));
    }

    #[test]
    fn test_revenue_by_period_keys() {
        // 2024-06-05 is a Wednesday; its week opens on Sunday 2024-06-02.
        let wed = Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap();
        let next_month = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();
        let orders = vec![order_at(1000, true, wed), order_at(2000, true, wed), order_at(999, false, wed), order_at(500, true, next_month)];

        let days = revenue_by_period(&orders, RevenuePeriod::Day);
        assert_eq!(days[0], RevenuePoint { date: "2024-06-05".into(), revenue: Decimal::new(3000, 2), orders: 2 });
        assert_eq!(days[1].date, "2024-07-01");

        let weeks = revenue_by_period(&orders, RevenuePeriod::Week);
        assert_eq!(weeks[0].date, "2024-06-02");
        assert_eq!(weeks[1].date, "2024-06-30");

        let months = revenue_by_period(&orders, RevenuePeriod::Month);
        assert_eq!(months.iter().map(|p| p.date.as_str()).collect::<Vec<_>>(), ["2024-06", "2024-07"]);
    }
}
