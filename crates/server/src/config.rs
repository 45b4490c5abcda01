//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit a local development run.
//!
//! - `MALL_DATABASE_URL` - `SQLite` connection string (fallback: `DATABASE_URL`,
//!   default: `sqlite://mall.db`)
//! - `MALL_HOST` - Bind address (default: 127.0.0.1)
//! - `MALL_PORT` - Listen port (default: 8080)
//! - `MALL_FIXTURES_DIR` - Root of the recorded JSON fixtures (default: `mock_server/api`)
//! - `MALL_SEED_ON_START` - Run the fixture seeder at boot (default: true)
//! - `MALL_LOG_JSON` - Emit logs as flattened JSON lines (default: false)
//! - `MALL_ADMIN_USERNAME` - Admin console username (default: admin)
//! - `MALL_ADMIN_PASSWORD` - Admin console password (default: admin123)
//! - `MALL_ADMIN_TOKEN` - Shared admin token returned by login (default: `ADMIN_SECRET_TOKEN_2025`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://mall.db";
const DEFAULT_FIXTURES_DIR: &str = "mock_server/api";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_ADMIN_TOKEN: &str = "ADMIN_SECRET_TOKEN_2025";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Fixture tree imported by the seeder
    pub fixtures_dir: PathBuf,
    /// Whether `main` runs the seeder before serving
    pub seed_on_start: bool,
    /// JSON log lines instead of human-readable text
    pub log_json: bool,
    /// Shared-secret admin console credentials
    pub admin: AdminConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
}

/// Admin console credentials.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct AdminConfig {
    /// Login username
    pub username: String,
    /// Login password
    pub password: SecretString,
    /// Token every admin call must present
    pub token: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_ADMIN_USERNAME.to_owned(),
            password: SecretString::from(DEFAULT_ADMIN_PASSWORD),
            token: SecretString::from(DEFAULT_ADMIN_TOKEN),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: SecretString::from(DEFAULT_DATABASE_URL),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            seed_on_start: true,
            log_json: false,
            admin: AdminConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("MALL_DATABASE_URL");
        let host = get_env_or_default("MALL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MALL_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MALL_PORT", &DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MALL_PORT".to_string(), e.to_string()))?;
        let fixtures_dir = PathBuf::from(get_env_or_default(
            "MALL_FIXTURES_DIR",
            DEFAULT_FIXTURES_DIR,
        ));
        let seed_on_start = parse_bool(
            "MALL_SEED_ON_START",
            &get_env_or_default("MALL_SEED_ON_START", "true"),
        )?;
        let log_json = parse_bool(
            "MALL_LOG_JSON",
            &get_env_or_default("MALL_LOG_JSON", "false"),
        )?;

        let admin = AdminConfig {
            username: get_env_or_default("MALL_ADMIN_USERNAME", DEFAULT_ADMIN_USERNAME),
            password: SecretString::from(get_env_or_default(
                "MALL_ADMIN_PASSWORD",
                DEFAULT_ADMIN_PASSWORD,
            )),
            token: SecretString::from(get_env_or_default("MALL_ADMIN_TOKEN", DEFAULT_ADMIN_TOKEN)),
        };

        Ok(Self {
            database_url,
            host,
            port,
            fixtures_dir,
            seed_on_start,
            log_json,
            admin,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(
            |_| SecretString::from(DEFAULT_DATABASE_URL),
            SecretString::from,
        )
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`).
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", " YES ").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(matches!(
            parse_bool("X", "maybe"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url.expose_secret(), "sqlite://mall.db");
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.admin.token.expose_secret(), "ADMIN_SECRET_TOKEN_2025");
        assert!(config.seed_on_start);
        assert!(!config.log_json);
    }

    #[test]
    fn test_admin_debug_redacts_secrets() {
        let debug = format!("{:?}", AdminConfig::default());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("admin123"));
        assert!(!debug.contains("ADMIN_SECRET_TOKEN_2025"));
    }
}
