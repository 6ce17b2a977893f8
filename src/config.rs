//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `PORT` - Listen port (default: 8083)
//! - `DATABASE_URL` - SQLite connection string (default: `sqlite://storefront.db?mode=rwc`)
//! - `NATS_URL` - Message bus for order events (optional)
//! - `ORDER_PREFIX` - Prefix for generated order numbers (default: `ORD3`)
//! - `CHECKOUT_DELAY_MS` - Simulated payment latency (default: 1200)

use std::time::Duration;

use thiserror::Error;

use crate::storefront::{CheckoutSettings, DEFAULT_ORDER_PREFIX};

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_DATABASE_URL: &str = "sqlite://storefront.db?mode=rwc";
const DEFAULT_CHECKOUT_DELAY_MS: u64 = 1200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub nats_url: Option<String>,
    pub checkout: CheckoutSettings,
}

impl Config {
    /// Loads `.env` if present, then reads the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let delay_ms = parse_or("CHECKOUT_DELAY_MS", get("CHECKOUT_DELAY_MS"), DEFAULT_CHECKOUT_DELAY_MS)?;
        Ok(Self {
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            nats_url: get("NATS_URL"),
            checkout: CheckoutSettings {
                order_prefix: get("ORDER_PREFIX").unwrap_or_else(|| DEFAULT_ORDER_PREFIX.to_string()),
                payment_latency: Duration::from_millis(delay_ms),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.database_url, "sqlite://storefront.db?mode=rwc");
        assert_eq!(config.nats_url, None);
        assert_eq!(config.checkout.order_prefix, "ORD3");
        assert_eq!(config.checkout.payment_latency, Duration::from_millis(1200));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[("PORT", "9000"), ("ORDER_PREFIX", "RX"), ("CHECKOUT_DELAY_MS", "0"), ("NATS_URL", "nats://localhost:4222")]).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.checkout.order_prefix, "RX");
        assert_eq!(config.checkout.payment_latency, Duration::ZERO);
        assert_eq!(config.nats_url.as_deref(), Some("nats://localhost:4222"));
    }

    #[test]
    fn test_invalid_port() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(ConfigError::InvalidEnvVar(key, _)) if key == "PORT"));
    }
}
