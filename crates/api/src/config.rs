//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use common::Money;
use seat_store::PriceTable;

/// Log output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: Postgres connection string; the in-memory store is
///   used when unset
/// - `DB_POOL_SIZE`: maximum pooled connections (default: `10`)
/// - `DB_ACQUIRE_TIMEOUT_SECS`: connection acquire timeout (default: `5`)
/// - `SEAT_COUNT`: seats provisioned at startup (default: `10`)
/// - `CHILD_PRICE_CENTS` / `ADULT_PRICE_CENTS`: seed prices (default:
///   `2500` / `5000`)
///
/// Unparseable values fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub db_pool_size: u32,
    pub db_acquire_timeout: Duration,
    pub seat_count: u32,
    pub child_price_cents: i64,
    pub adult_price_cents: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_pool_size: parse_var(&lookup, "DB_POOL_SIZE").unwrap_or(defaults.db_pool_size),
            db_acquire_timeout: parse_var(&lookup, "DB_ACQUIRE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.db_acquire_timeout),
            seat_count: parse_var(&lookup, "SEAT_COUNT").unwrap_or(defaults.seat_count),
            child_price_cents: parse_var::<i64>(&lookup, "CHILD_PRICE_CENTS")
                .filter(|cents| *cents >= 0)
                .unwrap_or(defaults.child_price_cents),
            adult_price_cents: parse_var::<i64>(&lookup, "ADULT_PRICE_CENTS")
                .filter(|cents| *cents >= 0)
                .unwrap_or(defaults.adult_price_cents),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Price table used to seed a freshly provisioned store.
    pub fn seed_prices(&self) -> PriceTable {
        PriceTable::new(
            Money::from_cents(self.child_price_cents),
            Money::from_cents(self.adult_price_cents),
        )
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            db_pool_size: 10,
            db_acquire_timeout: Duration::from_secs(5),
            seat_count: 10,
            child_price_cents: 2500,
            adult_price_cents: 5000,
        }
    }
}
