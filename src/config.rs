//! Runtime configuration, read from the environment (and `.env` when present).

use std::env;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_SUBJECT_PREFIX: &str = "storefront";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// PostgreSQL when set, the seeded in-memory store otherwise.
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Domain events go to NATS when set and are dropped otherwise.
    pub nats_url: Option<String>,
    pub subject_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            nats_url: None,
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Ok(Self {
            port: parse(var("PORT"), "PORT", defaults.port)?,
            database_url: var("DATABASE_URL"),
            max_connections: parse(var("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            nats_url: var("NATS_URL"),
            subject_prefix: var("NATS_SUBJECT_PREFIX").unwrap_or(defaults.subject_prefix),
        })
    }
}

fn parse<T: std::str::FromStr>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::NotANumber { name, value }),
    }
}
