//! Customer Manager
//!
//! Profiles are keyed by email and built up from completed checkouts.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use crate::domain::aggregates::customer::{normalize_email, SegmentDefinition, SEGMENT_DEFINITIONS};
use crate::domain::aggregates::{Customer, CustomerStats, Segment};
use crate::domain::repositories::CustomerRepository;
use crate::domain::value_objects::Money;
use crate::Result;

#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers }
    }

    /// Folds one order into the profile for `email`, creating it on first purchase.
    #[instrument(skip(self, phone, order_value))]
    pub async fn upsert(&self, email: &str, name: &str, phone: Option<String>, order_value: &Money) -> Result<Customer> {
        let customer = self
            .customers
            .record_order(&normalize_email(email), name, phone, order_value, Utc::now())
            .await?;
        if customer.total_orders == 1 {
            info!(id = %customer.id, "customer created");
        } else {
            debug!(id = %customer.id, orders = customer.total_orders, segment = ?customer.segment, "customer updated");
        }
        Ok(customer)
    }

    /// Most recent buyers first.
    pub async fn list(&self) -> Result<Vec<Customer>> {
        let mut customers = self.customers.list().await?;
        customers.sort_by(|a, b| b.last_order_date.cmp(&a.last_order_date));
        Ok(customers)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Customer>> {
        self.customers.get(id).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Customer>> {
        self.customers.by_email(&normalize_email(email)).await
    }

    pub async fn by_segment(&self, segment: Segment) -> Result<Vec<Customer>> {
        Ok(self.list().await?.into_iter().filter(|c| c.segment == segment).collect())
    }

    #[instrument(skip(self))]
    pub async fn add_tag(&self, id: &str, tag: &str) -> Result<()> {
        self.edit_tags(id, |c| c.add_tag(tag)).await
    }

    #[instrument(skip(self))]
    pub async fn remove_tag(&self, id: &str, tag: &str) -> Result<()> {
        self.edit_tags(id, |c| c.remove_tag(tag)).await
    }

    async fn edit_tags(&self, id: &str, edit: impl FnOnce(&mut Customer) -> bool) -> Result<()> {
        let Some(mut customer) = self.customers.get(id).await? else {
            debug!("tag edit for unknown customer ignored");
            return Ok(());
        };
        if edit(&mut customer) {
            self.customers.put(&customer).await?;
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<CustomerStats> {
        Ok(CustomerStats::compute(&self.customers.list().await?, Utc::now()))
    }

    pub fn segment_definitions(&self) -> &'static [SegmentDefinition] {
        &SEGMENT_DEFINITIONS
    }
}
