//! Demo back-office data served when the backend is unreachable.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use souk_core::{Order, OrderId, OrderStatus, PaymentMethod, User, UserId, UserRole};

/// Two sample orders.
#[must_use]
pub fn demo_orders() -> Vec<Order> {
    vec![
        demo_order("1", "John Doe", 15000, OrderStatus::Pending, 15),
        demo_order("2", "Jane Smith", 25000, OrderStatus::Completed, 14),
    ]
}

fn demo_order(id: &str, name: &str, total: i64, status: OrderStatus, day: u32) -> Order {
    Order {
        id: OrderId::new(id),
        name: name.to_string(),
        email: String::new(),
        address: String::new(),
        items: Vec::new(),
        payment_method: PaymentMethod::CashOnDelivery,
        status: Some(status),
        created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).single(),
        total: Some(Decimal::from(total)),
    }
}

/// Two sample customer accounts.
#[must_use]
pub fn demo_users() -> Vec<User> {
    vec![
        User {
            id: Some(UserId::new("1")),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            role: UserRole::Customer,
        },
        User {
            id: Some(UserId::new("2")),
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            role: UserRole::Customer,
        },
    ]
}
