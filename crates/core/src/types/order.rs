//! Order records as listed by the back office.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderStatus, PaymentMethod, ProductId};

/// One `{productId, quantity}` pair of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A placed order.
///
/// The backend omits `status`, `createdAt` and `total` on older records,
/// and some listings name the customer `customerName` without an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(alias = "customerName")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
}

impl Order {
    /// Number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}
