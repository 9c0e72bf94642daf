//! Unified error handling with Sentry integration.
//!
//! Each concern has its own error enum; [`Error`] wraps them for callers
//! that drive several (the CLI). [`Error::report`] captures unexpected
//! failures to Sentry before logging them.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Storefront-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart mutation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// REST backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Checkout was rejected or failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),
}

impl Error {
    /// Whether the error stems from user input rather than a fault.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Api(err) => err.is_not_found(),
            Self::Checkout(err) => err.is_user_error(),
            Self::Cart(err) => err.is_user_error(),
            Self::Storage(_) => false,
        }
    }

    /// Log the error, capturing faults to Sentry.
    pub fn report(&self) {
        if self.is_user_error() {
            tracing::warn!(error = %self, "Request rejected");
        } else {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        }
    }
}

/// Result type alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error. Without an initialized Sentry client this is a no-op.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::from(ApiError::NotFound("product 9".to_string()));
        assert_eq!(err.to_string(), "API error: Not found: product 9");
        assert!(err.is_user_error());

        let err = Error::from(CheckoutError::EmptyCart);
        assert_eq!(err.to_string(), "Checkout error: Cart is empty");
        assert!(err.is_user_error());
    }

    #[test]
    fn test_faults_are_not_user_errors() {
        let err = Error::from(StorageError::Unavailable("disk full".to_string()));
        assert!(!err.is_user_error());

        let err = Error::from(ApiError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_report_without_sentry_client() {
        Error::from(CheckoutError::EmptyCart).report();
        Error::from(StorageError::Unavailable("x".to_string())).report();
        add_breadcrumb("cart", "Added item", Some(&[("product_id", "1")]));
    }
}
