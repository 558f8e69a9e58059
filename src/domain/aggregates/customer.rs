//! Customer Aggregate

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::domain::value_objects::{prefixed_id, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment { New, Active, AtRisk, Churned, Vip, HighValue }

impl Segment {
    pub const ALL: [Segment; 6] = [Self::New, Self::Active, Self::AtRisk, Self::Churned, Self::Vip, Self::HighValue];
}

/// Lifecycle segment for a profile; first matching rule wins.
pub fn derive_segment(total_orders: u32, total_spent: Decimal, days_since_last_order: i64) -> Segment {
    if total_spent >= Decimal::from(500) { return Segment::Vip; }
    if total_orders >= 3 && total_spent >= Decimal::from(200) { return Segment::HighValue; }
    if total_orders == 1 && days_since_last_order <= 30 { return Segment::New; }
    if days_since_last_order <= 90 { return Segment::Active; }
    if days_since_last_order <= 180 { return Segment::AtRisk; }
    Segment::Churned
}

/// Profiles are keyed on this form: surrounding whitespace dropped, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub total_orders: u32,
    pub total_spent: Money,
    pub average_order_value: Money,
    pub first_order_date: DateTime<Utc>,
    pub last_order_date: DateTime<Utc>,
    pub segment: Segment,
    pub tags: Vec<String>,
}

impl Customer {
    pub fn first_order(email: &str, name: &str, phone: Option<String>, order_value: Money, now: DateTime<Utc>) -> Self {
        let mut customer = Self {
            id: prefixed_id("CUS"),
            email: normalize_email(email),
            name: name.to_string(),
            phone,
            total_orders: 1,
            average_order_value: order_value.clone(),
            total_spent: order_value,
            first_order_date: now,
            last_order_date: now,
            segment: Segment::New,
            tags: vec![],
        };
        customer.refresh_segment(now);
        customer
    }

    pub fn record_order(&mut self, name: &str, phone: Option<String>, order_value: &Money, now: DateTime<Utc>) -> Result<(), crate::domain::value_objects::MoneyError> {
        self.total_spent = self.total_spent.add(order_value)?;
        self.total_orders += 1;
        self.average_order_value = self.total_spent.average(self.total_orders as usize);
        self.name = name.to_string();
        if phone.is_some() { self.phone = phone; }
        self.last_order_date = now;
        self.refresh_segment(now);
        Ok(())
    }

    pub fn days_since_last_order(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_order_date).num_days()
    }

    pub fn refresh_segment(&mut self, now: DateTime<Utc>) {
        self.segment = derive_segment(self.total_orders, self.total_spent.amount(), self.days_since_last_order(now));
    }

    /// Returns `false` when the tag was already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) { return false; }
        self.tags.push(tag.to_string());
        true
    }

    /// Returns `false` when the tag was not present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total: usize,
    pub by_segment: BTreeMap<Segment, usize>,
    pub new_this_month: usize,
    pub active_this_month: usize,
    pub total_revenue: Money,
    pub average_lifetime_value: Money,
}

impl CustomerStats {
    pub fn compute(customers: &[Customer], now: DateTime<Utc>) -> Self {
        let month_ago = now - Duration::days(30);
        let mut by_segment: BTreeMap<Segment, usize> = Segment::ALL.iter().map(|s| (*s, 0)).collect();
        for customer in customers {
            *by_segment.entry(customer.segment).or_default() += 1;
        }
        let revenue: Decimal = customers.iter().map(|c| c.total_spent.amount()).sum();
        Self {
            total: customers.len(),
            by_segment,
            new_this_month: customers.iter().filter(|c| c.first_order_date >= month_ago).count(),
            active_this_month: customers.iter().filter(|c| c.last_order_date >= month_ago).count(),
            total_revenue: Money::usd(revenue),
            average_lifetime_value: Money::usd(revenue).average(customers.len()),
        }
    }
}

/// Human-facing description of a segment, for back-office listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SegmentDefinition {
    pub id: Segment,
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
}

pub const SEGMENT_DEFINITIONS: [SegmentDefinition; 6] = [
    SegmentDefinition { id: Segment::New, name: "New Customers", description: "Customers who made their first purchase within the last 30 days", color: "#4A8B65" },
    SegmentDefinition { id: Segment::Active, name: "Active Customers", description: "Customers who have purchased in the last 90 days", color: "#2D5A3D" },
    SegmentDefinition { id: Segment::AtRisk, name: "At Risk", description: "Customers who haven't purchased in 90-180 days", color: "#B8860B" },
    SegmentDefinition { id: Segment::Churned, name: "Churned", description: "Customers who haven't purchased in over 180 days", color: "#C0392B" },
    SegmentDefinition { id: Segment::Vip, name: "VIP Customers", description: "Customers with a lifetime spend of 500 or more", color: "#9B59B6" },
    SegmentDefinition { id: Segment::HighValue, name: "High Value", description: "Three or more orders and a lifetime spend of 200 or more", color: "#2C5F8A" },
];
