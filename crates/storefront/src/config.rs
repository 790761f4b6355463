//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `DOGHOUSE_API_URL` - Remote API base URL (default: `http://localhost:8000`)
//! - `DOGHOUSE_SYNC_DEBOUNCE_MS` - Quiet period before a cart sync fires (default: 500)
//! - `DOGHOUSE_NOTIFICATION_TTL_MS` - How long a banner stays up (default: 5000)
//! - `DOGHOUSE_AUTH_CHECK_DELAY_MS` - Login check delay on protected pages (default: 300)
//! - `DOGHOUSE_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: transport default)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_SYNC_DEBOUNCE_MS: u64 = 500;
const DEFAULT_NOTIFICATION_TTL_MS: u64 = 5000;
const DEFAULT_AUTH_CHECK_DELAY_MS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Cart synchronization timing
    pub cart: CartConfig,
    /// How long a notification banner stays visible
    pub notification_ttl: Duration,
    /// Delay before protected pages check the login state
    pub auth_check_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Remote API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the remote API; paths like `/orders/cart/` are joined onto it
    pub base_url: Url,
    /// Per-request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
}

/// Cart synchronization timing.
#[derive(Debug, Clone, Copy)]
pub struct CartConfig {
    /// Quiet period after the last mutation before the cart is written remotely
    pub sync_debounce: Duration,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            sync_debounce: Duration::from_millis(DEFAULT_SYNC_DEBOUNCE_MS),
        }
    }
}

impl ApiConfig {
    /// Configuration pointing at `base_url` with the transport's default timeout.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(
            "DOGHOUSE_API_URL",
            &get_env_or_default("DOGHOUSE_API_URL", DEFAULT_API_URL),
        )?;
        let request_timeout = get_optional_env("DOGHOUSE_REQUEST_TIMEOUT_SECS")
            .map(|v| parse_u64("DOGHOUSE_REQUEST_TIMEOUT_SECS", &v).map(Duration::from_secs))
            .transpose()?;

        let sync_debounce = get_millis("DOGHOUSE_SYNC_DEBOUNCE_MS", DEFAULT_SYNC_DEBOUNCE_MS)?;
        let notification_ttl =
            get_millis("DOGHOUSE_NOTIFICATION_TTL_MS", DEFAULT_NOTIFICATION_TTL_MS)?;
        let auth_check_delay =
            get_millis("DOGHOUSE_AUTH_CHECK_DELAY_MS", DEFAULT_AUTH_CHECK_DELAY_MS)?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                request_timeout,
            },
            cart: CartConfig { sync_debounce },
            notification_ttl,
            auth_check_delay,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Defaults for everything except the API location.
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            api: ApiConfig::new(base_url),
            cart: CartConfig::default(),
            notification_ttl: Duration::from_millis(DEFAULT_NOTIFICATION_TTL_MS),
            auth_check_delay: Duration::from_millis(DEFAULT_AUTH_CHECK_DELAY_MS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a millisecond duration with a default value.
fn get_millis(key: &str, default: u64) -> Result<Duration, ConfigError> {
    get_optional_env(key)
        .map_or(Ok(default), |v| parse_u64(key, &v))
        .map(Duration::from_millis)
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the API base URL, normalizing it to end with a slash so that
/// relative paths join under it instead of replacing the last segment.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("TEST", "http://localhost:8000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/");
        assert_eq!(
            url.join("orders/cart/").unwrap().as_str(),
            "http://localhost:8000/api/orders/cart/"
        );
    }

    #[test]
    fn test_parse_base_url_root() {
        let url = parse_base_url("TEST", "http://localhost:8000").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_parse_base_url_invalid() {
        let err = parse_base_url("DOGHOUSE_API_URL", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "DOGHOUSE_API_URL"));

        assert!(parse_base_url("TEST", "mailto:juan@doghouse.ph").is_err());
    }

    #[test]
    fn test_parse_u64_invalid() {
        let err = parse_u64("DOGHOUSE_SYNC_DEBOUNCE_MS", "soon").unwrap_err();
        assert!(err.to_string().contains("DOGHOUSE_SYNC_DEBOUNCE_MS"));
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::with_base_url(Url::parse("http://localhost:8000/").unwrap());
        assert_eq!(config.cart.sync_debounce, Duration::from_millis(500));
        assert_eq!(config.notification_ttl, Duration::from_secs(5));
        assert_eq!(config.auth_check_delay, Duration::from_millis(300));
        assert!(config.api.request_timeout.is_none());
    }
}
