//! Value Objects for the storefront

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Currency every catalog price is quoted in.
pub const STORE_CURRENCY: &str = "USD";

/// Catalog SKU, always stored as `SKU-<code>` in upper case.
///
/// The code is letters, digits and `-`; the `SKU-` prefix is added when the
/// input lacks it, so `"1001"`, `"sku-1001"` and `"SKU-1001"` are the same SKU.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

pub const SKU_PREFIX: &str = "SKU-";
pub const SKU_MAX_LEN: usize = 32;

impl Sku {
    pub fn new(value: impl AsRef<str>) -> Result<Self, SkuError> {
        let value = value.as_ref().trim().to_ascii_uppercase();
        let code = value.strip_prefix(SKU_PREFIX).unwrap_or(value.as_str());
        if code.is_empty() {
            return Err(SkuError::MissingCode);
        }
        if let Some(bad) = code.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
            return Err(SkuError::InvalidChar(bad));
        }
        let sku = format!("{SKU_PREFIX}{code}");
        if sku.len() > SKU_MAX_LEN {
            return Err(SkuError::TooLong(sku.len()));
        }
        Ok(Self(sku))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// The part after `SKU-`.
    pub fn code(&self) -> &str { self.0.strip_prefix(SKU_PREFIX).unwrap_or(&self.0) }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkuError {
    #[error("SKU has no code after the prefix")]
    MissingCode,
    #[error("SKU may only contain letters, digits and '-', found {0:?}")]
    InvalidChar(char),
    #[error("SKU is {0} characters, limit is 32")]
    TooLong(usize),
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn usd(amount: Decimal) -> Self { Self::new(amount, STORE_CURRENCY) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    /// `cents` in the store currency, e.g. `Money::cents(999)` is 9.99.
    pub fn cents(cents: i64) -> Self { Self::usd(Decimal::new(cents, 2)) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_zero(&self) -> bool { self.amount.is_zero() }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch { left: self.currency.clone(), right: other.currency.clone() });
        }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
    /// Divides by `count`, rounded to cents. Zero when `count` is zero.
    pub fn average(&self, count: usize) -> Money {
        if count == 0 { return Money::zero(&self.currency); }
        Money::new((self.amount / Decimal::from(count as u64)).round_dp(2), &self.currency)
    }
    pub fn sum<'a>(items: impl IntoIterator<Item = &'a Money>, currency: &str) -> Result<Money, MoneyError> {
        items.into_iter().try_fold(Money::zero(currency), |acc, m| acc.add(m))
    }
}

impl Default for Money { fn default() -> Self { Self::zero(STORE_CURRENCY) } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.amount, self.currency) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyError { CurrencyMismatch { left: String, right: String } }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::CurrencyMismatch { left, right } => write!(f, "Currency mismatch: {left} vs {right}") }
    }
}

/// Anonymous per-client identifier. Carts, wishlists and analytics events are
/// attributed to it; it is independent of any signed-in identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn generate() -> Self { Self(Uuid::new_v4().simple().to_string()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for SessionId { fn default() -> Self { Self::generate() } }

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Record identifier of the form `PREFIX-<millis>-<9 random chars>`,
/// e.g. `ORD-1718000000000-3F9A0C1B2`.
pub fn prefixed_id(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("{prefix}-{}-{}", Utc::now().timestamp_millis(), suffix.to_uppercase())
}
