//! Money amounts using decimal arithmetic.
//!
//! The backend speaks plain JSON numbers for prices (`"price": 2500`), so
//! amounts are carried as [`Decimal`] internally and encoded as floats on the
//! wire with `rust_decimal::serde::float`. Summing line totals in decimal
//! keeps `10.10 * 3` at exactly `30.30`.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A unit price as sent by the catalog.
///
/// Serializes as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build a price from whole currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, or `None` if the product does not fit in
    /// a [`Decimal`].
    #[must_use]
    pub fn checked_times(&self, quantity: u32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Self)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_money(self.0))
    }
}

/// Format an amount for display (e.g., `$19.99`).
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}
