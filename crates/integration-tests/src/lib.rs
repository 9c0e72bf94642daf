//! Integration tests for Souk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p souk-integration-tests
//! ```
//!
//! Every test starts its own [`StubBackend`], an in-process `axum` server
//! on `127.0.0.1:0` that speaks the REST contract the clients use, so no
//! external services are needed.
//!
//! # Test Categories
//!
//! - `storefront_api` - Catalog reads, caching and demo fallback
//! - `checkout_flow` - Cart to order submission
//! - `admin_client` - Session, listings and product management

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use souk_storefront::StorefrontConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Password the stub accepts for any username.
pub const ADMIN_PASSWORD: &str = "open-sesame";

/// Bearer token the stub hands out on login.
pub const ADMIN_TOKEN: &str = "stub-admin-token";

/// Recorded multipart upload.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub fields: HashMap<String, String>,
    pub image: Option<(String, Vec<u8>)>,
}

/// Mutable state behind the stub backend.
#[derive(Debug, Default)]
pub struct StubState {
    /// Products served by the catalog endpoints.
    pub products: Mutex<Vec<Value>>,
    /// Bodies received on `POST api/checkout`.
    pub orders: Mutex<Vec<Value>>,
    /// Multipart bodies received on admin product writes.
    pub uploads: Mutex<Vec<Upload>>,
    /// Catalog requests served (cache misses).
    pub catalog_hits: AtomicUsize,
    /// Answer every request with `503`.
    pub unavailable: AtomicBool,
    /// Answer `POST api/checkout` with `500`.
    pub reject_checkout: AtomicBool,
}

impl StubState {
    fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the received orders.
    #[must_use]
    pub fn received_orders(&self) -> Vec<Value> {
        Self::lock(&self.orders).clone()
    }

    /// Snapshot of the received uploads.
    #[must_use]
    pub fn received_uploads(&self) -> Vec<Upload> {
        Self::lock(&self.uploads).clone()
    }

    /// Snapshot of the current catalog.
    #[must_use]
    pub fn current_products(&self) -> Vec<Value> {
        Self::lock(&self.products).clone()
    }
}

/// A running stub backend. The server stops when this is dropped.
pub struct StubBackend {
    pub base_url: Url,
    pub state: Arc<StubState>,
    handle: JoinHandle<()>,
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl StubBackend {
    /// Start a stub seeded with a three-product catalog.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        *StubState::lock(&state.products) = seed_products();

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap_or_else(|e| panic!("failed to bind stub backend: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("stub backend has no address: {e}"));

        let app = router(Arc::clone(&state));
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/"))
            .unwrap_or_else(|e| panic!("invalid stub url: {e}"));
        Self {
            base_url,
            state,
            handle,
        }
    }

    /// Client configuration pointed at this stub.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        config_for(self.base_url.clone())
    }
}

/// Client configuration with a short timeout.
#[must_use]
pub fn config_for(base_url: Url) -> StorefrontConfig {
    let mut config = StorefrontConfig::for_base_url(base_url);
    config.http_timeout = Duration::from_secs(5);
    config
}

/// A base URL on which nothing is listening.
///
/// # Panics
///
/// Panics if a throwaway listener cannot be bound.
pub async fn unreachable_base_url() -> Url {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap_or_else(|e| panic!("failed to bind throwaway listener: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("throwaway listener has no address: {e}"));
    drop(listener);
    Url::parse(&format!("http://{addr}/")).unwrap_or_else(|e| panic!("invalid url: {e}"))
}

fn seed_products() -> Vec<Value> {
    vec![
        json!({"id": "1", "title": "Shirt", "description": "Plain cotton shirt", "price": 10, "category": "clothing", "image": "/uploads/shirt.png"}),
        json!({"id": "2", "title": "Mug", "description": "Stoneware mug", "price": 7.5, "category": "kitchen", "image": ""}),
        json!({"id": "3", "title": "Scarf", "description": "Wool scarf", "price": 22.25, "category": "clothing", "image": "/uploads/scarf.png"}),
    ]
}

// =============================================================================
// Routes
// =============================================================================

type Shared = Arc<StubState>;

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/checkout", post(checkout))
        .route("/api/admin/login", post(admin_login))
        .route(
            "/api/admin/products",
            get(admin_products).post(admin_create_product),
        )
        .route(
            "/api/admin/products/{id}",
            put(admin_update_product).delete(admin_delete_product),
        )
        .route("/api/admin/orders", get(admin_orders))
        .route("/api/admin/users", get(admin_users))
        .with_state(state)
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response()
}

#[derive(Deserialize)]
struct CategoryQuery {
    category: Option<String>,
}

async fn list_products(State(state): State<Shared>, Query(query): Query<CategoryQuery>) -> Response {
    if state.unavailable.load(Ordering::SeqCst) {
        return unavailable();
    }
    state.catalog_hits.fetch_add(1, Ordering::SeqCst);
    let products: Vec<Value> = StubState::lock(&state.products)
        .iter()
        .filter(|p| {
            query
                .category
                .as_deref()
                .is_none_or(|c| p["category"].as_str() == Some(c))
        })
        .cloned()
        .collect();
    Json(products).into_response()
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    if state.unavailable.load(Ordering::SeqCst) {
        return unavailable();
    }
    state.catalog_hits.fetch_add(1, Ordering::SeqCst);
    StubState::lock(&state.products)
        .iter()
        .find(|p| p["id"].as_str() == Some(id.as_str()))
        .cloned()
        .map_or_else(
            || (StatusCode::NOT_FOUND, "no such product").into_response(),
            |p| Json(p).into_response(),
        )
}

async fn checkout(State(state): State<Shared>, Json(order): Json<Value>) -> Response {
    if state.unavailable.load(Ordering::SeqCst) || state.reject_checkout.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "order failed").into_response();
    }
    let mut orders = StubState::lock(&state.orders);
    orders.push(order);
    let id = format!("order-{}", orders.len());
    Json(json!({"orderId": id, "message": "Order placed"})).into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn admin_login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    if state.unavailable.load(Ordering::SeqCst) {
        return unavailable();
    }
    if body.username.is_empty() || body.password != ADMIN_PASSWORD {
        return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
    }
    Json(json!({"token": ADMIN_TOKEN})).into_response()
}

/// `None` when the request carries the stub's bearer token.
fn reject_unauthorized(state: &StubState, headers: &HeaderMap) -> Option<Response> {
    if state.unavailable.load(Ordering::SeqCst) {
        return Some(unavailable());
    }
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ADMIN_TOKEN}"));
    if authorized {
        None
    } else {
        Some((StatusCode::UNAUTHORIZED, "invalid token").into_response())
    }
}

async fn admin_products(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(rejection) = reject_unauthorized(&state, &headers) {
        return rejection;
    }
    Json(state.current_products()).into_response()
}

async fn admin_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(rejection) = reject_unauthorized(&state, &headers) {
        return rejection;
    }
    let orders: Vec<Value> = state
        .received_orders()
        .into_iter()
        .enumerate()
        .map(|(i, mut order)| {
            order["id"] = json!(format!("order-{}", i + 1));
            order["status"] = json!("pending");
            order
        })
        .collect();
    Json(orders).into_response()
}

async fn admin_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(rejection) = reject_unauthorized(&state, &headers) {
        return rejection;
    }
    Json(json!([
        {"id": "u1", "name": "Ada", "email": "ada@example.com", "role": "admin"},
        {"id": "u2", "name": "Grace", "email": "grace@example.com"},
        {"id": "u3", "name": "Linus", "email": "linus@example.com", "role": "customer"}
    ]))
    .into_response()
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, Response> {
    let bad_request = |e: axum::extract::multipart::MultipartError| {
        (StatusCode::BAD_REQUEST, e.to_string()).into_response()
    };
    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(bad_request)?;
            upload.image = Some((file_name, bytes.to_vec()));
        } else {
            let value = field.text().await.map_err(bad_request)?;
            upload.fields.insert(name, value);
        }
    }
    Ok(upload)
}

fn product_from_upload(id: &str, upload: &Upload) -> Value {
    let field = |key: &str| upload.fields.get(key).cloned().unwrap_or_default();
    let price: f64 = field("price").parse().unwrap_or_default();
    let image = upload
        .image
        .as_ref()
        .map(|(name, _)| format!("/uploads/{name}"))
        .unwrap_or_default();
    json!({
        "id": id,
        "title": field("title"),
        "description": field("description"),
        "price": price,
        "category": field("category"),
        "image": image,
    })
}

async fn admin_create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Some(rejection) = reject_unauthorized(&state, &headers) {
        return rejection;
    }
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(rejection) => return rejection,
    };

    let mut products = StubState::lock(&state.products);
    let product = product_from_upload(&(products.len() + 100).to_string(), &upload);
    products.push(product.clone());
    StubState::lock(&state.uploads).push(upload);
    (StatusCode::CREATED, Json(json!({"message": "created", "product": product}))).into_response()
}

async fn admin_update_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    if let Some(rejection) = reject_unauthorized(&state, &headers) {
        return rejection;
    }
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(rejection) => return rejection,
    };

    let mut products = StubState::lock(&state.products);
    let Some(slot) = products
        .iter_mut()
        .find(|p| p["id"].as_str() == Some(id.as_str()))
    else {
        return (StatusCode::NOT_FOUND, "no such product").into_response();
    };
    let product = product_from_upload(&id, &upload);
    *slot = product.clone();
    StubState::lock(&state.uploads).push(upload);
    Json(product).into_response()
}

async fn admin_delete_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Some(rejection) = reject_unauthorized(&state, &headers) {
        return rejection;
    }
    let mut products = StubState::lock(&state.products);
    let before = products.len();
    products.retain(|p| p["id"].as_str() != Some(id.as_str()));
    if products.len() == before {
        return (StatusCode::NOT_FOUND, "no such product").into_response();
    }
    Json(json!({"message": "deleted"})).into_response()
}
