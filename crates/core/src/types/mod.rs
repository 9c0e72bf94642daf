//! Core types for Souk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderLine};
pub use price::{Price, format_money};
pub use product::{Product, ProductSnapshot};
pub use status::*;
pub use user::User;
