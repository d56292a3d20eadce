//! Application configuration loaded from environment variables.

use domain::CartPolicy;
use domain::policy::DEFAULT_MIN_LINE_QUANTITY;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `DATABASE_URL` — Postgres connection string; the in-memory store
///   is used when unset
/// - `CART_MIN_LINE_QUANTITY` — minimum quantity per cart line
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub cart_min_line_quantity: u32,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL").ok(),
            cart_min_line_quantity: std::env::var("CART_MIN_LINE_QUANTITY")
                .ok()
                .and_then(|q| q.parse().ok())
                .unwrap_or(DEFAULT_MIN_LINE_QUANTITY),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the cart line policy configured for this server.
    pub fn cart_policy(&self) -> CartPolicy {
        CartPolicy::with_min_line_quantity(self.cart_min_line_quantity)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            cart_min_line_quantity: DEFAULT_MIN_LINE_QUANTITY,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cart_min_line_quantity, 11);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_cart_policy_follows_config() {
        let config = Config {
            cart_min_line_quantity: 1,
            ..Config::default()
        };
        assert!(config.cart_policy().check_quantity(1).is_ok());
    }
}
