//! API configuration module.
//!
//! Configuration is loaded from environment variables (after `.env`, see
//! `main.rs`) with fallback to defaults.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use chrono_tz::Tz;
use kasir_db::DbConfig;

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_DB: &str = ":memory:";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address
    pub host: IpAddr,

    /// HTTP port (0 = ephemeral)
    pub port: u16,

    /// SQLite file, or `:memory:`
    pub db_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// How long a writer waits on a locked database before giving up
    pub db_busy_timeout: Duration,

    /// Timezone for the transaction list date filter when the caller
    /// does not name one
    pub default_timezone: Tz,

    /// Allowed front-end origin; permissive when unset
    pub cors_origin: Option<HeaderValue>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(ApiConfig {
            host: parse_var("KASIR_HOST", "0.0.0.0")?,
            port: parse_var("KASIR_PORT", "8080")?,
            db_path: env::var("KASIR_DB_PATH").unwrap_or_else(|_| "kasir.db".to_string()),
            db_max_connections: parse_var("KASIR_DB_MAX_CONNECTIONS", "5")?,
            db_busy_timeout: Duration::from_millis(parse_var("KASIR_DB_BUSY_TIMEOUT_MS", "5000")?),
            default_timezone: parse_var("KASIR_DEFAULT_TIMEZONE", "Asia/Jakarta")?,
            cors_origin: env::var("KASIR_CORS_ORIGIN")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| HeaderValue::from_str(s.trim()))
                .transpose()
                .map_err(|_| ConfigError::InvalidValue("KASIR_CORS_ORIGIN".to_string()))?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        let config = if self.db_path == IN_MEMORY_DB {
            DbConfig::in_memory()
        } else {
            DbConfig::new(PathBuf::from(&self.db_path)).max_connections(self.db_max_connections)
        };
        config.busy_timeout(self.db_busy_timeout)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let port: u16 = parse_var("KASIR_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);

        let tz: Tz = parse_var("KASIR_TEST_UNSET_TZ", "Asia/Makassar").unwrap();
        assert_eq!(tz, chrono_tz::Asia::Makassar);
    }

    #[test]
    fn test_parse_var_rejects_bad_default() {
        let result: Result<u16, _> = parse_var("KASIR_TEST_UNSET_PORT", "eighty");
        assert!(matches!(result, Err(ConfigError::InvalidValue(name)) if name == "KASIR_TEST_UNSET_PORT"));

        let result: Result<Tz, _> = parse_var("KASIR_TEST_UNSET_TZ", "Mars/Olympus");
        assert!(result.is_err());
    }
}
