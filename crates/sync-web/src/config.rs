//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Default bind address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:insights.db?mode=rwc";

/// Sync server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `SYNC_ADDR` | Server bind address | `127.0.0.1:8000` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:insights.db?mode=rwc` |
    ///
    /// Guesty credentials and the reservation lookback are read by the
    /// client and engine crates themselves.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("SYNC_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        Ok(Self { addr, database_url })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid SYNC_ADDR format")]
    InvalidAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_invalid_addr() {
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("SYNC_ADDR");
        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.to_string(), DEFAULT_ADDR);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);

        std::env::set_var("SYNC_ADDR", "not-an-addr");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidAddr)));
        std::env::remove_var("SYNC_ADDR");
    }
}
