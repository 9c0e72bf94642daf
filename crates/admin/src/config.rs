//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! Everything the storefront reads (see
//! [`StorefrontConfig`](souk_storefront::StorefrontConfig)), plus:
//!
//! ## Optional
//! - `SOUK_ADMIN_USERNAME` - Default login name (default: `admin`)
//! - `SOUK_ADMIN_PASSWORD` - Password used by non-interactive logins

use secrecy::SecretString;
use souk_storefront::StorefrontConfig;
use souk_storefront::config::ConfigError;

const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Back-office client configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AdminConfig {
    /// Backend, storage and timeout settings shared with the storefront
    pub storefront: StorefrontConfig,
    /// Login name used when none is given explicitly
    pub username: String,
    /// Admin password, if provided through the environment
    pub password: Option<SecretString>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("storefront", &self.storefront)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
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
        let storefront = StorefrontConfig::from_lookup(&lookup)?;
        let username = lookup("SOUK_ADMIN_USERNAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
        let password = lookup("SOUK_ADMIN_PASSWORD")
            .filter(|v| !v.is_empty())
            .map(SecretString::from);

        Ok(Self {
            storefront,
            username,
            password,
        })
    }

    /// The configured password.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `SOUK_ADMIN_PASSWORD` is unset.
    pub fn require_password(&self) -> Result<&SecretString, ConfigError> {
        self.password
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SOUK_ADMIN_PASSWORD".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_password_is_redacted() {
        let config = AdminConfig::from_lookup(|key| match key {
            "SOUK_ADMIN_PASSWORD" => Some("hunter2-hunter2".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.require_password().unwrap().expose_secret(), "hunter2-hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.username, "admin");
        assert!(matches!(
            config.require_password(),
            Err(ConfigError::MissingEnvVar(key)) if key == "SOUK_ADMIN_PASSWORD"
        ));
    }
}
