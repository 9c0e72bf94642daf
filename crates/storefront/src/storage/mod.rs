//! Client-local persistent storage.
//!
//! Mirrors the browser `localStorage` contract: string values under string
//! keys, synchronous reads and writes. The cart and the admin session token
//! each live under one fixed key.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - Shared in-process map. Clones see the same data,
//!   which lets tests simulate a restart by building a second store over a
//!   clone.
//! - [`FileStorage`] - One JSON file per key in a data directory, replaced
//!   atomically on write.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Storage key holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "cart";

/// Storage key holding the admin bearer token.
pub const ADMIN_TOKEN_STORAGE_KEY: &str = "adminToken";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters the backend cannot store.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A key/value storage area.
///
/// Implementations must be safe to share between threads; every call is
/// expected to complete before returning (no buffering).
pub trait StorageArea: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value could not be durably written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys are used as file names, so keep them to a safe alphabet.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key(CART_STORAGE_KEY).is_ok());
        assert!(validate_key(ADMIN_TOKEN_STORAGE_KEY).is_ok());
        assert!(validate_key("a-b_c1").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("with space").is_err());
    }
}
