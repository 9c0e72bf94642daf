//! Checkout: turn the cart into an order and submit it.
//!
//! The order payload carries only `{productId, quantity}` pairs; prices
//! are re-derived by the backend. The cart is cleared only after the
//! backend accepts the order.

use rust_decimal::Decimal;
use serde::Serialize;
use souk_core::{Email, EmailError, OrderLine, PaymentMethod};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::api::{ApiError, OrderReceipt};
use crate::cart::{CartStore, LineItem};
use crate::error::add_breadcrumb;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    /// A required form field is blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The backend rejected the order or could not be reached.
    #[error("Failed to place order: {0}")]
    Submit(#[from] ApiError),
}

impl CheckoutError {
    /// Whether the customer can fix the problem by changing their input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyCart | Self::MissingField(_) | Self::InvalidEmail(_)
        )
    }
}

/// Customer details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub payment_method: PaymentMethod,
}

/// Wire payload for `POST api/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    /// Build a cash-on-delivery form from raw input.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidEmail` if `email` is malformed.
    pub fn cash_on_delivery(name: &str, email: &str, address: &str) -> Result<Self, CheckoutError> {
        Ok(Self {
            name: name.to_string(),
            email: Email::parse(email)?,
            address: address.to_string(),
            payment_method: PaymentMethod::CashOnDelivery,
        })
    }
}

impl OrderRequest {
    /// Build the payload from the form and a cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::MissingField`.
    pub fn build(form: &CheckoutForm, items: &[LineItem]) -> Result<Self, CheckoutError> {
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let name = form.name.trim();
        if name.is_empty() {
            return Err(CheckoutError::MissingField("name"));
        }
        let address = form.address.trim();
        if address.is_empty() {
            return Err(CheckoutError::MissingField("address"));
        }

        Ok(Self {
            name: name.to_string(),
            email: form.email.clone(),
            address: address.to_string(),
            items: items
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            payment_method: form.payment_method,
        })
    }
}

/// Anything that can accept an order.
pub trait OrderGateway: Send + Sync {
    /// Submit `order` to the backend.
    fn submit_order(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<OrderReceipt, ApiError>> + Send;
}

/// What the customer sees after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub customer: String,
    pub email: Email,
    /// Cart total at the time of the order.
    pub total: Decimal,
    pub item_count: u64,
    pub payment_method: PaymentMethod,
    pub receipt: OrderReceipt,
}

/// Checkout flow over a cart and an order gateway.
#[derive(Debug, Clone)]
pub struct Checkout<G> {
    cart: CartStore,
    gateway: G,
}

impl<G: OrderGateway> Checkout<G> {
    #[must_use]
    pub const fn new(cart: CartStore, gateway: G) -> Self {
        Self { cart, gateway }
    }

    /// Validate the form, submit the cart and clear it on success.
    ///
    /// A failed submission leaves the cart untouched. If the order went
    /// through but the cart could not be cleared, the failure is reported
    /// and the confirmation is still returned.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if validation or submission fails.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn place_order(&self, form: &CheckoutForm) -> Result<OrderConfirmation, CheckoutError> {
        let cart = self.cart.snapshot();
        let summary = cart.summary();
        let order = OrderRequest::build(form, cart.items())?;

        let receipt = match self.gateway.submit_order(&order).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(error = %e, "Order submission failed, cart kept");
                return Err(CheckoutError::Submit(e));
            }
        };

        if let Err(e) = self.cart.clear() {
            let event_id = sentry::capture_error(&e);
            error!(
                error = %e,
                sentry_event_id = %event_id,
                "Order placed but cart could not be cleared"
            );
        }

        info!(
            item_count = summary.item_count,
            total = %summary.total,
            order_id = ?receipt.order_id,
            "Order placed"
        );
        add_breadcrumb("checkout", "Order placed", None);

        Ok(OrderConfirmation {
            customer: order.name,
            email: order.email,
            total: summary.total,
            item_count: summary.item_count,
            payment_method: order.payment_method,
            receipt,
        })
    }
}
