//! Analytics events and the rollups derived from them.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use crate::domain::value_objects::{prefixed_id, SessionId};

/// Events kept in the log; older ones are dropped.
pub const EVENT_LOG_CAP: usize = 1000;
pub const RECENT_EVENT_COUNT: usize = 50;
pub const TOP_PRODUCT_COUNT: usize = 5;

pub type EventData = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType { PageView, ProductView, AddToCart, RemoveFromCart, CheckoutStart, CheckoutComplete, Search }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
    pub session_id: SessionId,
}

impl AnalyticsEvent {
    pub fn new(session_id: SessionId, kind: EventType, data: EventData) -> Self {
        Self { id: prefixed_id("EVT"), kind, data, timestamp: Utc::now(), session_id }
    }

    /// UTC calendar date of the event, `YYYY-MM-DD`.
    pub fn day(&self) -> String { day_key(self.timestamp) }

    /// `productId` carried in the payload; absent or zero means none.
    pub fn product_id(&self) -> Option<u64> {
        self.data.get("productId").and_then(Value::as_u64).filter(|id| *id != 0)
    }

    /// `orderValue` carried in the payload, as a number or a decimal string.
    pub fn order_value(&self) -> Decimal {
        match self.data.get("orderValue") {
            Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .unwrap_or(Decimal::ZERO),
            Some(Value::String(s)) => Decimal::from_str(s).unwrap_or(Decimal::ZERO),
            _ => Decimal::ZERO,
        }
    }

    fn is_view(&self) -> bool { matches!(self.kind, EventType::PageView | EventType::ProductView) }
}

fn day_key(at: DateTime<Utc>) -> String { at.format("%Y-%m-%d").to_string() }

fn on_day<'a>(events: &'a [AnalyticsEvent], day: &'a str) -> impl Iterator<Item = &'a AnalyticsEvent> {
    events.iter().filter(move |e| e.day() == day)
}

/// `part / whole` as a rounded percentage; 0 when `whole` is 0.
fn percent(part: usize, whole: usize) -> i64 {
    if whole == 0 { return 0; }
    (part as f64 / whole as f64 * 100.0).round() as i64
}

fn percent_change(today: f64, yesterday: f64) -> i64 {
    if yesterday <= 0.0 { return 0; }
    ((today - yesterday) / yesterday * 100.0).round() as i64
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    pub date: String,
    pub page_views: usize,
    pub product_views: usize,
    pub add_to_carts: usize,
    pub checkouts_started: usize,
    pub checkouts_completed: usize,
    pub revenue: Decimal,
    pub conversion_rate: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_events: usize,
    pub events_by_type: BTreeMap<EventType, usize>,
    pub recent_events: Vec<AnalyticsEvent>,
    pub daily_metrics: Vec<DailyMetrics>,
}

impl AnalyticsReport {
    /// `events` oldest first, as stored.
    pub fn compute(events: &[AnalyticsEvent]) -> Self {
        let mut events_by_type = BTreeMap::new();
        let mut daily: BTreeMap<String, DailyMetrics> = BTreeMap::new();
        for event in events {
            *events_by_type.entry(event.kind).or_insert(0) += 1;
            let date = event.day();
            let day = daily.entry(date.clone()).or_insert_with(|| DailyMetrics { date, ..DailyMetrics::default() });
            match event.kind {
                EventType::PageView => day.page_views += 1,
                EventType::ProductView => day.product_views += 1,
                EventType::AddToCart => day.add_to_carts += 1,
                EventType::CheckoutStart => day.checkouts_started += 1,
                EventType::CheckoutComplete => {
                    day.checkouts_completed += 1;
                    day.revenue += event.order_value();
                }
                EventType::RemoveFromCart | EventType::Search => {}
            }
        }
        let daily_metrics = daily
            .into_values()
            .rev()
            .map(|mut d| {
                d.conversion_rate = percent(d.checkouts_completed, d.checkouts_started);
                d
            })
            .collect();
        Self {
            total_events: events.len(),
            events_by_type,
            recent_events: events.iter().rev().take(RECENT_EVENT_COUNT).cloned().collect(),
            daily_metrics,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: u64,
    pub product_name: String,
    pub views: usize,
    pub add_to_carts: usize,
    pub purchases: usize,
    pub revenue: Decimal,
    pub conversion_rate: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison { pub views_change: i64, pub orders_change: i64, pub revenue_change: i64 }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_views: usize,
    pub today_orders: usize,
    pub today_revenue: Decimal,
    pub conversion_rate: i64,
    pub top_products: Vec<TopProduct>,
    pub period_comparison: PeriodComparison,
}

#[derive(Default)]
struct DayTotals { views: usize, orders: usize, starts: usize, revenue: Decimal }

impl DayTotals {
    fn of<'a>(events: impl Iterator<Item = &'a AnalyticsEvent>) -> Self {
        let mut totals = Self::default();
        for event in events {
            if event.is_view() { totals.views += 1; }
            match event.kind {
                EventType::CheckoutStart => totals.starts += 1,
                EventType::CheckoutComplete => {
                    totals.orders += 1;
                    totals.revenue += event.order_value();
                }
                _ => {}
            }
        }
        totals
    }
}

impl DashboardStats {
    pub fn compute(events: &[AnalyticsEvent], now: DateTime<Utc>) -> Self {
        let today = day_key(now);
        let yesterday = day_key(now - Duration::days(1));
        let t = DayTotals::of(on_day(events, &today));
        let y = DayTotals::of(on_day(events, &yesterday));

        Self {
            today_views: t.views,
            today_orders: t.orders,
            today_revenue: t.revenue,
            conversion_rate: percent(t.orders, t.starts),
            top_products: top_products(events),
            period_comparison: PeriodComparison {
                views_change: percent_change(t.views as f64, y.views as f64),
                orders_change: percent_change(t.orders as f64, y.orders as f64),
                revenue_change: percent_change(
                    t.revenue.to_f64().unwrap_or_default(),
                    y.revenue.to_f64().unwrap_or_default(),
                ),
            },
        }
    }
}

/// Products ranked by view count, from every event that names a product.
pub fn top_products(events: &[AnalyticsEvent]) -> Vec<TopProduct> {
    let mut by_product: HashMap<u64, TopProduct> = HashMap::new();
    for event in events {
        let Some(product_id) = event.product_id() else { continue };
        let entry = by_product.entry(product_id).or_insert_with(|| TopProduct {
            product_id,
            product_name: event.data.get("productName").and_then(Value::as_str).unwrap_or("Unknown").to_string(),
            views: 0, add_to_carts: 0, purchases: 0, revenue: Decimal::ZERO, conversion_rate: 0,
        });
        match event.kind {
            EventType::ProductView => entry.views += 1,
            EventType::AddToCart => entry.add_to_carts += 1,
            EventType::CheckoutComplete => {
                entry.purchases += 1;
                entry.revenue += event.order_value();
            }
            _ => {}
        }
    }
    let mut ranked: Vec<TopProduct> = by_product
        .into_values()
        .map(|mut p| {
            p.conversion_rate = percent(p.add_to_carts, p.views);
            p
        })
        .collect();
    ranked.sort_by(|a, b| b.views.cmp(&a.views).then(a.product_id.cmp(&b.product_id)));
    ranked.truncate(TOP_PRODUCT_COUNT);
    ranked
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_report_groups_by_event_day() {
        let d1 = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2024, 6, 2, 0, 1, 0).unwrap();
        let events = vec![
            event_at(EventType::PageView, json!({"path": "/"}), d1),
            event_at(EventType::CheckoutStart, json!({"cartValue": 40}), d1),
            event_at(EventType::CheckoutStart, json!({"cartValue": 40}), d1),
            event_at(EventType::CheckoutComplete, json!({"orderValue": 40.5, "orderId": "ORD-1"}), d1),
            event_at(EventType::CheckoutComplete, json!({"orderValue": "10.25"}), d2),
        ];
        let report = AnalyticsReport::compute(&events);
        assert_eq!(report.total_events, 5);
        assert_eq!(report.events_by_type[&EventType::CheckoutStart], 2);
        assert_eq!(report.daily_metrics[0].date, "2024-06-02");
        assert_eq!(report.daily_metrics[0].revenue, Decimal::new(1025, 2));
        let first = &report.daily_metrics[1];
        assert_eq!(first.page_views, 1);
        assert_eq!(first.revenue, Decimal::new(405, 1));
        assert_eq!(first.conversion_rate, 50);
        assert_eq!(report.recent_events[0].timestamp, d2);
    }

    #[test]
    fn test_recent_events_are_capped() {
        let now = Utc::now();
        let events: Vec<_> = (0..60).map(|i| view(i + 1, now)).collect();
        let report = AnalyticsReport::compute(&events);
        assert_eq!(report.recent_events.len(), RECENT_EVENT_COUNT);
        assert_eq!(report.recent_events[0].product_id(), Some(60));
    }

    #[test]
    fn test_dashboard_compares_with_yesterday() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let yesterday = now - Duration::days(1);
        let events = vec![
            view(1, yesterday),
            view(1, yesterday),
            view(1, now),
            view(1, now),
            view(2, now),
            event_at(EventType::CheckoutStart, json!({}), now),
            event_at(EventType::CheckoutComplete, json!({"orderValue": 100}), now),
            event_at(EventType::CheckoutComplete, json!({"orderValue": 50}), yesterday),
        ];
        let stats = DashboardStats::compute(&events, now);
        assert_eq!(stats.today_views, 3);
        assert_eq!(stats.today_orders, 1);
        assert_eq!(stats.today_revenue, Decimal::from(100));
        assert_eq!(stats.conversion_rate, 100);
        assert_eq!(stats.period_comparison.views_change, 50);
        assert_eq!(stats.period_comparison.orders_change, 0);
        assert_eq!(stats.period_comparison.revenue_change, 100);
    }

    #[test]
    fn test_top_products_rank_by_views() {
        let now = Utc::now();
        let mut events: Vec<_> = (1..=7).flat_map(|id| (0..id).map(move |_| view(id, now))).collect();
        events.push(event_at(EventType::AddToCart, json!({"productId": 7, "productName": "P7"}), now));
        events.push(event_at(EventType::AddToCart, json!({"productId": 0}), now));
        events.push(event_at(EventType::PageView, json!({"path": "/"}), now));
        let top = top_products(&events);
        assert_eq!(top.len(), TOP_PRODUCT_COUNT);
        assert_eq!(top[0].product_id, 7);
        assert_eq!(top[0].views, 7);
        assert_eq!(top[0].add_to_carts, 1);
        assert_eq!(top[0].conversion_rate, 14);
        assert_eq!(top[4].product_id, 3);
    }
}
