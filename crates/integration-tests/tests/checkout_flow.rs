//! Cart to order, end to end over file storage and the stub backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::sync::atomic::Ordering;

use rust_decimal::Decimal;
use serde_json::json;
use souk_core::{ProductId, ProductSnapshot};
use souk_integration_tests::{StubBackend, config_for, unreachable_base_url};
use souk_storefront::{
    ApiClient, ApiError, CartStore, Checkout, CheckoutError, CheckoutForm, FileStorage,
};

async fn cart_with_shirts(api: &ApiClient, storage: &FileStorage) -> CartStore {
    let cart = CartStore::load(Arc::new(storage.clone()));
    let shirt = ProductSnapshot::from(api.product("1").await.unwrap());
    cart.add_item(&shirt, 2).unwrap();
    cart.add_item(&shirt, 1).unwrap();
    cart
}

fn form() -> CheckoutForm {
    CheckoutForm::cash_on_delivery("Jane Doe", "jane@example.com", "1 Main St").unwrap()
}

#[tokio::test]
async fn test_order_is_submitted_and_cart_cleared() {
    let stub = StubBackend::start().await;
    let api = ApiClient::new(&stub.config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();

    let cart = cart_with_shirts(&api, &storage).await;
    assert_eq!(cart.total(), Decimal::from(30));

    let confirmation = Checkout::new(cart.clone(), api)
        .place_order(&form())
        .await
        .unwrap();
    assert_eq!(confirmation.total, Decimal::from(30));
    assert_eq!(confirmation.item_count, 3);
    assert_eq!(confirmation.receipt.order_id.unwrap().as_str(), "order-1");

    assert_eq!(
        stub.state.received_orders(),
        vec![json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "address": "1 Main St",
            "items": [{"productId": "1", "quantity": 3}],
            "paymentMethod": "Cash on Delivery"
        })]
    );

    assert!(cart.is_empty());
    let reloaded = CartStore::load(Arc::new(storage));
    assert!(reloaded.is_empty());
}

#[tokio::test]
async fn test_rejected_order_keeps_cart() {
    let stub = StubBackend::start().await;
    stub.state.reject_checkout.store(true, Ordering::SeqCst);
    let api = ApiClient::new(&stub.config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();

    let cart = cart_with_shirts(&api, &storage).await;
    let err = Checkout::new(cart.clone(), api)
        .place_order(&form())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Submit(ApiError::Api { status: 500, .. })
    ));

    let reloaded = CartStore::load(Arc::new(storage));
    assert_eq!(reloaded.items(), cart.items());
    assert_eq!(reloaded.item_count(), 3);
}

#[tokio::test]
async fn test_checkout_never_uses_demo_fallback() {
    let api = ApiClient::new(&config_for(unreachable_base_url().await)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();

    // Demo catalog still lets the cart fill up offline.
    let cart = CartStore::load(Arc::new(storage));
    let phone = ProductSnapshot::from(api.product("6").await.unwrap());
    cart.add_item(&phone, 1).unwrap();

    let err = Checkout::new(cart.clone(), api)
        .place_order(&form())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Submit(ApiError::Http(_))));
    assert_eq!(cart.items()[0].product_id, ProductId::new("6"));
}

#[tokio::test]
async fn test_empty_cart_never_reaches_backend() {
    let stub = StubBackend::start().await;
    let api = ApiClient::new(&stub.config()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cart = CartStore::load(Arc::new(FileStorage::open(dir.path()).unwrap()));

    let err = Checkout::new(cart, api).place_order(&form()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert!(stub.state.received_orders().is_empty());
}
