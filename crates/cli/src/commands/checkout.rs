//! Checkout command.

use souk_core::format_money;
use souk_storefront::error::Result;
use souk_storefront::{ApiClient, CartStore, Checkout, CheckoutForm};

/// Submit the persisted cart as a cash-on-delivery order.
///
/// # Errors
///
/// Returns an error if the form is invalid, the cart is empty, or the
/// backend rejects the order (the cart is then left as it was).
pub async fn place(
    cart: CartStore,
    api: ApiClient,
    name: &str,
    email: &str,
    address: &str,
) -> Result<()> {
    let form = CheckoutForm::cash_on_delivery(name, email, address)?;
    let confirmation = Checkout::new(cart, api).place_order(&form).await?;

    tracing::info!(
        customer = %confirmation.customer,
        email = %confirmation.email,
        item_count = confirmation.item_count,
        total = %format_money(confirmation.total),
        payment_method = %confirmation.payment_method,
        order_id = ?confirmation.receipt.order_id,
        "Order confirmed, a confirmation email is on its way"
    );
    Ok(())
}
