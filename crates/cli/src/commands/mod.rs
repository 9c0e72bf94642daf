//! Subcommand implementations.

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod products;
