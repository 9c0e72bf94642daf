//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SOUK_API_BASE_URL` - REST backend base URL (default: `http://127.0.0.1:5000`)
//! - `SOUK_DATA_DIR` - Directory for persisted client state (default: `.souk`)
//! - `SOUK_OFFLINE_CATALOG` - Serve the demo catalog when the backend is down (default: true)
//! - `SOUK_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `SOUK_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_DATA_DIR: &str = ".souk";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the REST backend, always ending in `/`
    pub api_base_url: Url,
    /// Directory holding persisted client state (cart, admin token)
    pub data_dir: PathBuf,
    /// Fall back to the built-in demo catalog when the backend is unreachable
    pub offline_fallback: bool,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// How long catalog responses stay cached
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = parse_base_url(
            "SOUK_API_BASE_URL",
            &lookup("SOUK_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;
        let data_dir = lookup("SOUK_DATA_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let offline_fallback = lookup("SOUK_OFFLINE_CATALOG")
            .map_or(Ok(true), |v| parse_bool("SOUK_OFFLINE_CATALOG", &v))?;
        let http_timeout = Duration::from_secs(parse_u64_or(
            &lookup,
            "SOUK_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let catalog_cache_ttl = Duration::from_secs(parse_u64_or(
            &lookup,
            "SOUK_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CACHE_TTL_SECS,
        )?);

        Ok(Self {
            api_base_url,
            data_dir,
            offline_fallback,
            http_timeout,
            catalog_cache_ttl,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT").filter(|v| !v.is_empty()),
        })
    }

    /// Defaults pointed at a specific backend.
    #[must_use]
    pub fn for_base_url(api_base_url: Url) -> Self {
        Self {
            api_base_url: with_trailing_slash(api_base_url),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            offline_fallback: true,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL and make sure relative joins keep its path.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(with_trailing_slash(url))
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

fn parse_u64_or<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |v| {
        v.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
