//! Configuration management.
//!
//! Configuration is read from environment variables once at startup,
//! validated, and passed into application state as an immutable struct.
//!
//! ## Configuration variables
//!
//! - `DATABASE_URL`: SQLite database path (default: `bolster.db`)
//! - `BIND_ADDRESS`: HTTP server bind address (default: `0.0.0.0:3000`)
//! - `BASE_URL`: Public base URL used in emails (default: derived from bind address)
//! - `SESSION_SECRET`: Required; rejects placeholder values
//! - `GATEWAY_BASE_URL`: Payment gateway API base (default: `https://api.gateway.test/v1`)
//! - `GATEWAY_KEY_ID` / `GATEWAY_KEY_SECRET`: Required gateway credentials
//! - `MAIL_API_URL` / `MAIL_API_KEY` / `MAIL_FROM`: Mail transport (optional; mail is skipped when unset)
//! - `UPLOAD_DIR`: Where uploads land (default: `public/uploads`)
//! - `FREE_SHIPPING_OVER_MINOR` / `SHIPPING_FLAT_FEE_MINOR`: Shipping policy in minor units
//! - `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS`: Per-IP rate limit (default: 100 / 900)
//! - `COOKIE_SECURE`: Set to `true` behind TLS in production

use bolster_commerce::money::{Currency, Money};
use bolster_commerce::cart::ShippingPolicy;
use std::env;
use thiserror::Error;

/// Configuration errors surfaced at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Immutable application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub base_url: String,
    pub session_secret: String,
    pub gateway_base_url: String,
    pub gateway_key_id: String,
    pub gateway_key_secret: String,
    pub mail_api_url: Option<String>,
    pub mail_api_key: String,
    pub mail_from: String,
    pub upload_dir: String,
    pub shipping: ShippingPolicy,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub cookie_secure: bool,
}

impl Config {
    /// Build configuration from the environment, validating as we go.
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret = required("SESSION_SECRET")?;
        if session_secret.len() < 16 {
            return Err(ConfigError::Invalid {
                name: "SESSION_SECRET",
                value: "(too short)".to_string(),
            });
        }

        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port_of(&bind_address)));

        let free_over = parse_i64("FREE_SHIPPING_OVER_MINOR", 99_900)?;
        let flat_fee = parse_i64("SHIPPING_FLAT_FEE_MINOR", 5_000)?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bolster.db".to_string()),
            bind_address,
            base_url,
            session_secret,
            gateway_base_url: env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.gateway.test/v1".to_string()),
            gateway_key_id: required("GATEWAY_KEY_ID")?,
            gateway_key_secret: required("GATEWAY_KEY_SECRET")?,
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|v| !v.is_empty()),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "orders@bolster.test".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "public/uploads".to_string()),
            shipping: ShippingPolicy::new(
                Money::new(free_over, Currency::INR),
                Money::new(flat_fee, Currency::INR),
            ),
            rate_limit_max: parse_i64("RATE_LIMIT_MAX", 100)? as u32,
            rate_limit_window_secs: parse_i64("RATE_LIMIT_WINDOW_SECS", 900)? as u64,
            cookie_secure: env::var("COOKIE_SECURE").map(|v| v == "true").unwrap_or(false),
        })
    }

    /// The currency the store charges in.
    pub fn currency(&self) -> Currency {
        self.shipping.flat_fee.currency
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_i64(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn port_of(bind_address: &str) -> &str {
    bind_address.rsplit(':').next().unwrap_or("3000")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_of() {
        assert_eq!(port_of("0.0.0.0:3000"), "3000");
        assert_eq!(port_of("127.0.0.1:8080"), "8080");
    }
}
