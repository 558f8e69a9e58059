//! OpenSASE Storefront
//!
//! Back end for a small demo storefront.
//!
//! ## Features
//! - Product catalog browsing and search
//! - Per-session cart and wishlist
//! - Checkout with stock validation and compensating stock restoration
//! - Inventory transactions and deduplicated stock alerts
//! - Customer profiles with lifecycle segments
//! - Analytics event log with daily and top-product rollups
//!
//! State lives behind one repository trait per entity (see
//! [`domain::repositories`]). [`infrastructure::memory::MemoryStore`] backs
//! tests and local runs, [`infrastructure::postgres::PgStore`] backs
//! production.

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::domain::value_objects::MoneyError;

// =============================================================================
// Error Types
// =============================================================================

/// A cart line whose quantity exceeds the live stock of its variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockIssue {
    pub product_id: u32,
    pub variant_id: String,
    pub product_name: String,
    pub variant_name: String,
    pub requested: u32,
    pub available: u32,
}

impl fmt::Display for StockIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): Only {} available",
            self.product_name, self.variant_name, self.available
        )
    }
}

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Stock validation failed: {}", join_issues(.0))]
    StockValidation(Vec<StockIssue>),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl EcommerceError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    pub fn variant_not_found(product_id: u32, variant_id: &str) -> Self {
        Self::not_found("Variant", format!("{product_id}/{variant_id}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<validator::ValidationErrors> for EcommerceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<sqlx::Error> for EcommerceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for EcommerceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

fn join_issues(issues: &[StockIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

pub type Result<T> = std::result::Result<T, EcommerceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_validation_lists_every_line() {
        let err = EcommerceError::StockValidation(vec![
            StockIssue {
                product_id: 1,
                variant_id: "var-1".into(),
                product_name: "Tote".into(),
                variant_name: "Natural".into(),
                requested: 4,
                available: 2,
            },
            StockIssue {
                product_id: 2,
                variant_id: "var-2".into(),
                product_name: "Mug".into(),
                variant_name: "Cream".into(),
                requested: 3,
                available: 0,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Stock validation failed: Tote (Natural): Only 2 available, Mug (Cream): Only 0 available"
        );
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = EcommerceError::variant_not_found(7, "var-7001");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Variant not found: 7/var-7001");
    }
}
