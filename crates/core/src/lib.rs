//! Souk Core - Shared domain types.
//!
//! This crate provides the types shared by every Souk component:
//! - `storefront` - Cart store, catalog and checkout client
//! - `admin` - Back-office client for products, orders and users
//! - `cli` - The `souk` command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. Wire formats (field names, number encodings) are
//! defined here so every crate agrees on them.
//!
//! # Modules
//!
//! - [`types`] - Ids, money, emails, statuses and catalog/order records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
