//! Souk Storefront library.
//!
//! Client-side storefront logic: the persisted shopping cart, the catalog
//! and checkout client for the REST backend, and the local storage it all
//! sits on.
//!
//! # Modules
//!
//! - [`cart`] - Cart state and the observable, persisted [`cart::CartStore`]
//! - [`api`] - Catalog and checkout client with demo-catalog fallback
//! - [`checkout`] - Order building and submission
//! - [`storage`] - `localStorage`-style key/value backends
//! - [`config`] - Environment configuration
//! - [`error`] - Aggregate error type and Sentry helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod storage;

pub use api::{ApiClient, ApiError, OrderReceipt};
pub use cart::{CartError, CartState, CartStore, CartSummary, LineItem, Subscription};
pub use checkout::{Checkout, CheckoutError, CheckoutForm, OrderConfirmation, OrderGateway};
pub use config::StorefrontConfig;
pub use storage::{FileStorage, MemoryStorage, StorageArea, StorageError};
