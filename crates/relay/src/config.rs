//! Relay configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MAILERLITE_API_KEY` - MailerLite API bearer token
//!
//! ## Optional
//! - `RELAY_HOST` - Bind address (default: 127.0.0.1)
//! - `RELAY_PORT` - Listen port (default: 3000)
//! - `KIWIFY_WEBHOOK_TOKEN` - Shared webhook secret; unset disables the
//!   token check
//! - `RELAY_PROCESS_UNKNOWN_PRODUCTS` - Process events for products the
//!   catalog does not know (default: false)
//! - `RELAY_DRY_RUN` - Classify and plan but issue no remote mutations
//!   (default: false)
//! - `RELAY_TAGS_ENABLED` - Apply tag mutations in addition to group
//!   mutations (default: true)
//! - `RELAY_PRODUCT_CATALOG` - Path to a JSON product catalog file; unset
//!   uses the built-in catalog
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Relay application configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct RelayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// MailerLite API bearer token
    pub mailerlite_api_key: SecretString,
    /// Shared webhook secret compared against `x-kiwify-token` / `x-token`
    /// headers or the payload `token` field
    pub webhook_token: Option<SecretString>,
    /// Process events for products the catalog does not know
    pub process_unknown_products: bool,
    /// Plan but never issue remote mutations
    pub dry_run: bool,
    /// Apply tag mutations in addition to group mutations
    pub tags_enabled: bool,
    /// Path to a JSON product catalog file overriding the built-in catalog
    pub catalog_path: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("mailerlite_api_key", &"[REDACTED]")
            .field(
                "webhook_token",
                &self.webhook_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("process_unknown_products", &self.process_unknown_products)
            .field("dry_run", &self.dry_run)
            .field("tags_enabled", &self.tags_enabled)
            .field("catalog_path", &self.catalog_path)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("RELAY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("RELAY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("RELAY_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("RELAY_PORT".to_string(), e.to_string()))?;

        let mailerlite_api_key = get_required_secret("MAILERLITE_API_KEY")?;
        let webhook_token = get_optional_env("KIWIFY_WEBHOOK_TOKEN").map(SecretString::from);

        let process_unknown_products = get_bool_env("RELAY_PROCESS_UNKNOWN_PRODUCTS", false)?;
        let dry_run = get_bool_env("RELAY_DRY_RUN", false)?;
        let tags_enabled = get_bool_env("RELAY_TAGS_ENABLED", true)?;

        let catalog_path = get_optional_env("RELAY_PRODUCT_CATALOG").map(PathBuf::from);
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            host,
            port,
            mailerlite_api_key,
            webhook_token,
            process_unknown_products,
            dry_run,
            tags_enabled,
            catalog_path,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The shared webhook secret, if one is configured.
    #[must_use]
    pub fn webhook_token(&self) -> Option<&str> {
        self.webhook_token.as_ref().map(ExposeSecret::expose_secret)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a boolean environment variable with a default value.
fn get_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => parse_bool(&raw).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{raw}'"),
            )
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a boolean from the usual environment spellings.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
