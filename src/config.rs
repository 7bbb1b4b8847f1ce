//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The configuration is constructed once
//! at process start and injected explicitly into the services that need
//! it; there is no global configuration object.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level service configuration.
///
/// Loaded once at startup via [`AppConfig::from_env`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// SQLite connection string (e.g. `sqlite://data/event.db`).
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Root directory for uploaded proof images.
    pub upload_root: PathBuf,

    /// City code embedded in generated ticket codes.
    pub city_code: String,

    /// Probability cap for awarding a product-tier prize on a single
    /// redemption draw. Must be in `[0, 1]`.
    pub product_max_probability: f64,

    /// Rate-limit window length in milliseconds.
    pub rate_limit_window_ms: u64,

    /// Maximum requests per key within one rate-limit window.
    pub rate_limit_max: u32,

    /// Seconds between sweeps of expired rate-limit windows.
    pub rate_limit_sweep_secs: u64,

    /// Shared secret gating all admin endpoints.
    pub admin_secret: String,

    /// Salt mixed into the client IP before hashing.
    pub ip_hash_salt: String,

    /// Telegram bot token for the notification sink (empty = disabled).
    pub telegram_bot_token: String,

    /// Telegram chat ID for the notification sink (empty = disabled).
    pub telegram_chat_id: String,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/event.db".to_string());

        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 5);

        let upload_root = PathBuf::from(
            std::env::var("UPLOAD_ROOT").unwrap_or_else(|_| "public/uploads".to_string()),
        );

        let city_code = std::env::var("CITY_CODE").unwrap_or_else(|_| "KOL".to_string());
        let product_max_probability = parse_env("PRODUCT_MAX_PROBABILITY", 0.01);

        let rate_limit_window_ms = parse_env("RATE_LIMIT_WINDOW_MS", 60_000);
        let rate_limit_max = parse_env("RATE_LIMIT_MAX", 5);
        let rate_limit_sweep_secs = parse_env("RATE_LIMIT_SWEEP_SECS", 60);

        let admin_secret = std::env::var("ADMIN_SECRET").unwrap_or_default();
        let ip_hash_salt = std::env::var("IP_HASH_SALT").unwrap_or_default();

        let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        let telegram_chat_id = std::env::var("TELEGRAM_CHAT_ID").unwrap_or_default();

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections,
            upload_root,
            city_code,
            product_max_probability,
            rate_limit_window_ms,
            rate_limit_max,
            rate_limit_sweep_secs,
            admin_secret,
            ip_hash_salt,
            telegram_bot_token,
            telegram_chat_id,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            upload_root: PathBuf::from("public/uploads"),
            city_code: "KOL".to_string(),
            product_max_probability: 0.01,
            rate_limit_window_ms: 60_000,
            rate_limit_max: 5,
            rate_limit_sweep_secs: 60,
            admin_secret: String::new(),
            ip_hash_salt: String::new(),
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.city_code, "KOL");
        assert!(cfg.product_max_probability > 0.0 && cfg.product_max_probability < 1.0);
        assert!(cfg.rate_limit_max > 0);
    }

    #[test]
    fn parse_env_falls_back_when_unset() {
        let parsed: u32 = parse_env("RAFFLE_TEST_UNSET_VARIABLE", 7);
        assert_eq!(parsed, 7);
    }
}
