//! Client-side shopping cart.
//!
//! - [`CartState`] - Pure line-item list with the uniqueness and
//!   positive-quantity rules.
//! - [`CartStore`] - Shared, persisted, observable owner of a `CartState`.
//! - [`Subscription`] - Handle for removing a change listener.

mod state;
mod store;
mod subscribers;

pub use state::{CartState, CartSummary, LineItem};
pub use store::CartStore;
pub use subscribers::Subscription;

use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised by cart mutations.
///
/// Reads never fail; loading never fails (bad data yields an empty cart).
#[derive(Debug, Error)]
pub enum CartError {
    /// The new cart could not be written; the previous cart is still current.
    #[error("Failed to persist cart: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be serialized.
    #[error("Failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The change would make the cart total unrepresentable; nothing was written.
    #[error("Cart total is too large")]
    TotalOverflow,
}

impl CartError {
    /// Whether the caller asked for something the cart cannot hold.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::TotalOverflow)
    }
}
