//! Souk Admin library.
//!
//! Back-office client for the Souk REST backend: admin session handling,
//! product management, and order and user listings.
//!
//! # Security
//!
//! The admin bearer token grants write access to the catalog. It is held
//! in a `SecretString` and persisted only under the `adminToken` storage key.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod forms;

pub use client::{AdminClient, DashboardSummary};
pub use config::AdminConfig;
pub use error::AdminError;
pub use forms::{ImageUpload, ProductForm};
