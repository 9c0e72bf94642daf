//! Catalog client against the stub backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::atomic::Ordering;

use rust_decimal::Decimal;
use souk_integration_tests::{StubBackend, config_for, unreachable_base_url};
use souk_storefront::{ApiClient, ApiError};

#[tokio::test]
async fn test_products_and_product() {
    let stub = StubBackend::start().await;
    let api = ApiClient::new(&stub.config()).unwrap();

    let products = api.products().await.unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[1].price.amount(), Decimal::new(75, 1));

    let shirt = api.product("1").await.unwrap();
    assert_eq!(shirt.title, "Shirt");
    assert_eq!(shirt.price.amount(), Decimal::from(10));
}

#[tokio::test]
async fn test_products_by_category() {
    let stub = StubBackend::start().await;
    let api = ApiClient::new(&stub.config()).unwrap();

    let clothing = api.products_by_category("clothing").await.unwrap();
    let ids: Vec<_> = clothing.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["1", "3"]);

    assert!(api.products_by_category("garden").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let stub = StubBackend::start().await;
    let api = ApiClient::new(&stub.config()).unwrap();

    let err = api.product("404").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_catalog_is_cached() {
    let stub = StubBackend::start().await;
    let api = ApiClient::new(&stub.config()).unwrap();

    api.products().await.unwrap();
    api.products().await.unwrap();
    api.product("1").await.unwrap();
    api.product("1").await.unwrap();
    assert_eq!(stub.state.catalog_hits.load(Ordering::SeqCst), 2);

    api.invalidate_catalog();
    api.products().await.unwrap();
    assert_eq!(stub.state.catalog_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_server_error_falls_back_to_demo_catalog() {
    let stub = StubBackend::start().await;
    stub.state.unavailable.store(true, Ordering::SeqCst);
    let api = ApiClient::new(&stub.config()).unwrap();

    let products = api.products().await.unwrap();
    assert_eq!(products.len(), 6);
    assert_eq!(products[0].title, "Premium Wireless Headphones");

    let electronics = api.products_by_category("electronics").await.unwrap();
    assert_eq!(electronics.len(), 3);
}

#[tokio::test]
async fn test_fallback_can_be_disabled() {
    let stub = StubBackend::start().await;
    stub.state.unavailable.store(true, Ordering::SeqCst);
    let mut config = stub.config();
    config.offline_fallback = false;
    let api = ApiClient::new(&config).unwrap();

    let err = api.products().await.unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_unreachable_backend_uses_demo_product() {
    let api = ApiClient::new(&config_for(unreachable_base_url().await)).unwrap();

    let watch = api.product("2").await.unwrap();
    assert_eq!(watch.title, "Smart Watch");
    assert_eq!(watch.image, "/placeholder.svg");

    let err = api.product("999").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_image_url_resolves_against_backend() {
    let stub = StubBackend::start().await;
    let api = ApiClient::new(&stub.config()).unwrap();

    let shirt = api.product("1").await.unwrap();
    assert_eq!(
        api.image_url(&shirt.image),
        format!("{}uploads/shirt.png", stub.base_url)
    );
    assert_eq!(api.image_url(""), "/placeholder.svg");
}
