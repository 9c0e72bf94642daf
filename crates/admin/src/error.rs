//! Error handling for the back-office client.

use souk_storefront::config::ConfigError;
use souk_storefront::{ApiError, StorageError};
use thiserror::Error;

/// Errors raised by [`AdminClient`](crate::AdminClient) and product forms.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No admin session; call `login` first.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The backend rejected the username or password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The backend rejected the session token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A product form failed validation.
    #[error("Invalid product: {0}")]
    Validation(String),

    /// An image file could not be read.
    #[error("Failed to read image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// REST backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The session token could not be persisted.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl AdminError {
    /// Whether the error stems from operator input rather than a fault.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        match self {
            Self::NotLoggedIn
            | Self::InvalidCredentials
            | Self::Unauthorized(_)
            | Self::Validation(_)
            | Self::Image { .. }
            | Self::Config(_) => true,
            Self::Api(err) => err.is_not_found(),
            Self::Storage(_) => false,
        }
    }

    /// Log the error, capturing faults to Sentry.
    pub fn report(&self) {
        if self.is_user_error() {
            tracing::warn!(error = %self, "Admin request rejected");
        } else {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request failed"
            );
        }
    }
}

/// Set the Sentry user context to the logged-in admin.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_error_display() {
        assert_eq!(AdminError::NotLoggedIn.to_string(), "Not logged in");
        assert_eq!(
            AdminError::Validation("title is required".to_string()).to_string(),
            "Invalid product: title is required"
        );
        assert_eq!(
            AdminError::from(ApiError::NotFound("product 9".to_string())).to_string(),
            "API error: Not found: product 9"
        );
    }

    #[test]
    fn test_user_errors() {
        assert!(AdminError::InvalidCredentials.is_user_error());
        assert!(AdminError::from(ApiError::NotFound("x".to_string())).is_user_error());
        assert!(
            !AdminError::from(ApiError::Api {
                status: 502,
                message: String::new()
            })
            .is_user_error()
        );
        assert!(!AdminError::from(StorageError::Unavailable("x".to_string())).is_user_error());
    }

    #[test]
    fn test_sentry_user_without_client() {
        set_sentry_user("admin");
        clear_sentry_user();
    }
}
