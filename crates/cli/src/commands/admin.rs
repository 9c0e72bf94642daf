//! Back-office commands.
//!
//! # Usage
//!
//! ```bash
//! SOUK_ADMIN_PASSWORD=… souk admin login -u admin
//! souk admin add-product --title "Smart Watch" --price 25000 --category electronics --image watch.png
//! souk admin delete-product 7
//! ```
//!
//! # Environment Variables
//!
//! - `SOUK_ADMIN_PASSWORD` - Password used by `admin login`
//! - `SOUK_ADMIN_USERNAME` - Default username for `admin login`

use souk_admin::{AdminClient, AdminConfig, AdminError, ProductForm};
use souk_core::{ProductId, format_money};

/// Log in with the configured password.
///
/// # Errors
///
/// Returns `AdminError` if no password is configured or the login fails.
pub async fn login(admin: &AdminClient, username: &str, config: &AdminConfig) -> Result<(), AdminError> {
    let password = config.require_password()?;
    admin.login(username, password).await?;
    tracing::info!(username, "Login successful");
    Ok(())
}

/// Log product, order and user counts.
///
/// # Errors
///
/// Returns `AdminError` if any listing fails.
pub async fn dashboard(admin: &AdminClient) -> Result<(), AdminError> {
    let summary = admin.dashboard().await?;
    tracing::info!(
        total_products = summary.total_products,
        total_orders = summary.total_orders,
        total_users = summary.total_users,
        "Dashboard"
    );
    Ok(())
}

/// Log every product.
///
/// # Errors
///
/// Returns `AdminError` if the listing fails.
pub async fn products(admin: &AdminClient) -> Result<(), AdminError> {
    let products = admin.products().await?;
    for product in &products {
        tracing::info!(
            id = %product.id,
            price = %product.price,
            category = %product.category,
            "{}",
            product.title
        );
    }
    tracing::info!(count = products.len(), "Products listed");
    Ok(())
}

/// Log every order.
///
/// # Errors
///
/// Returns `AdminError` if the listing fails.
pub async fn orders(admin: &AdminClient) -> Result<(), AdminError> {
    let orders = admin.orders().await?;
    for order in &orders {
        tracing::info!(
            id = %order.id,
            customer = %order.name,
            units = order.unit_count(),
            total = %order.total.map(format_money).unwrap_or_default(),
            status = %order.status.map(|s| s.to_string()).unwrap_or_default(),
            created_at = ?order.created_at,
            "Order"
        );
    }
    tracing::info!(count = orders.len(), "Orders listed");
    Ok(())
}

/// Log every user.
///
/// # Errors
///
/// Returns `AdminError` if the listing fails.
pub async fn users(admin: &AdminClient) -> Result<(), AdminError> {
    let users = admin.users().await?;
    for user in &users {
        tracing::info!(email = %user.email, role = %user.role, "{}", user.name);
    }
    tracing::info!(count = users.len(), "Users listed");
    Ok(())
}

/// Create a product.
///
/// # Errors
///
/// Returns `AdminError` if the form is invalid or the request fails.
pub async fn add_product(admin: &AdminClient, form: &ProductForm) -> Result<(), AdminError> {
    let created = admin.create_product(form).await?;
    tracing::info!(
        id = ?created.map(|p| p.id),
        "Product added successfully"
    );
    Ok(())
}

/// Replace a product's fields.
///
/// # Errors
///
/// Returns `AdminError` if the form is invalid or the request fails.
pub async fn update_product(admin: &AdminClient, id: &str, form: &ProductForm) -> Result<(), AdminError> {
    admin.update_product(&ProductId::new(id), form).await?;
    tracing::info!(id, "Product updated successfully");
    Ok(())
}

/// Delete a product.
///
/// # Errors
///
/// Returns `AdminError` if the request fails.
pub async fn delete_product(admin: &AdminClient, id: &str) -> Result<(), AdminError> {
    admin.delete_product(&ProductId::new(id)).await?;
    tracing::info!(id, "Product deleted successfully");
    Ok(())
}
