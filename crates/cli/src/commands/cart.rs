//! Cart commands.
//!
//! Every mutation is followed by a badge line logged from a cart
//! subscription, the way a header badge would re-render.

use souk_core::{ProductId, ProductSnapshot, format_money};
use souk_storefront::error::Result;
use souk_storefront::{ApiClient, CartStore, Subscription};

/// Log the item count and total after every cart change.
pub fn attach_badge(cart: &CartStore) -> Subscription {
    let handle = cart.clone();
    cart.subscribe(move || {
        let summary = handle.summary();
        tracing::info!(
            item_count = summary.item_count,
            total = %format_money(summary.total),
            "Cart badge"
        );
    })
}

/// Log every line and the cart total.
pub fn show(cart: &CartStore) {
    let cart = cart.snapshot();
    if cart.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }
    for item in cart.items() {
        tracing::info!(
            product_id = %item.product_id,
            quantity = item.quantity,
            unit_price = %item.price,
            line_total = %item.line_total().map(format_money).unwrap_or_default(),
            "{}",
            item.title
        );
    }
    let summary = cart.summary();
    tracing::info!(
        item_count = summary.item_count,
        total = %format_money(summary.total),
        "Cart total"
    );
}

/// Look the product up in the catalog and add it to the cart.
///
/// # Errors
///
/// Returns an error if the product is unknown or the cart cannot be saved.
pub async fn add(cart: &CartStore, api: &ApiClient, id: &str, quantity: u32) -> Result<()> {
    let product = api.product(id).await?;
    let snapshot = ProductSnapshot::from(&product);
    cart.add_item(&snapshot, quantity)?;
    tracing::info!(product_id = %snapshot.id, quantity, "Added {}", snapshot.title);
    Ok(())
}

/// Remove a product from the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn remove(cart: &CartStore, id: &str) -> Result<()> {
    cart.remove_item(&ProductId::new(id))?;
    Ok(())
}

/// Set a product's quantity; zero or less removes it.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn update(cart: &CartStore, id: &str, quantity: i64) -> Result<()> {
    let product_id = ProductId::new(id);
    if quantity > 0 && cart.items().iter().all(|item| item.product_id != product_id) {
        tracing::warn!(product_id = %product_id, "Product is not in the cart");
        return Ok(());
    }
    cart.update_quantity(&product_id, quantity)?;
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn clear(cart: &CartStore) -> Result<()> {
    cart.clear()?;
    Ok(())
}
