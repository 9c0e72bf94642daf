//! REST client for the public storefront API.
//!
//! # Endpoints
//!
//! - `GET  api/products` - Full catalog
//! - `GET  api/products?category=…` - Catalog filtered by category
//! - `GET  api/products/{id}` - One product
//! - `POST api/checkout` - Place an order
//!
//! Catalog reads are cached with `moka`. When the backend is unreachable
//! (transport error or 5xx) and offline fallback is enabled, catalog reads
//! are served from the built-in demo catalog instead. Checkout never falls
//! back.

mod cache;
pub mod demo;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use souk_core::{OrderId, Product};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::checkout::{OrderGateway, OrderRequest};
use crate::config::StorefrontConfig;

use cache::{CacheKey, CacheValue};

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

const MAX_CACHED_ENTRIES: u64 = 1000;

/// Errors that can occur when talking to the REST backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the backend could not serve the request at all.
    ///
    /// Only these errors trigger the demo-catalog fallback.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// What the backend returns after accepting an order.
///
/// The backend's body is loosely specified; unknown fields are ignored
/// and an empty body yields the default receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    #[serde(default, alias = "id", alias = "_id")]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Turn a non-success response into an [`ApiError`].
///
/// `404` becomes [`ApiError::NotFound`] carrying `what`.
///
/// # Errors
///
/// Returns the mapped error for any non-2xx status.
pub async fn ensure_success(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(what.to_string()));
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Api {
        status: status.as_u16(),
        message: body.chars().take(200).collect(),
    })
}

/// Build the shared HTTP client from configuration.
///
/// # Errors
///
/// Returns `ApiError::Http` if the client cannot be constructed.
pub fn http_client(config: &StorefrontConfig) -> Result<reqwest::Client, ApiError> {
    Ok(reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!("souk/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the public storefront API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    offline_fallback: bool,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_ENTRIES)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: http_client(config)?,
                base_url: config.api_base_url.clone(),
                offline_fallback: config.offline_fallback,
                cache,
            }),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an image path against the backend host.
    ///
    /// An empty path yields the placeholder image.
    #[must_use]
    pub fn image_url(&self, path: &str) -> String {
        if path.is_empty() {
            return PLACEHOLDER_IMAGE.to_string();
        }
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_or_else(|_| path.to_string(), String::from)
    }

    /// Drop every cached catalog response.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend fails and fallback is disabled or
    /// not applicable.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let url = self.endpoint("api/products")?;
        match self.get_json::<Vec<Product>>(url, "products").await {
            Ok(products) => {
                self.inner
                    .cache
                    .insert(CacheKey::Products, CacheValue::Products(products.clone()))
                    .await;
                Ok(products)
            }
            Err(e) => self.fallback(e, demo::demo_products),
        }
    }

    /// List the products of one category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend fails and fallback is disabled or
    /// not applicable.
    #[instrument(skip(self))]
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        let key = CacheKey::Category(category.to_string());
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for category");
            return Ok(products);
        }

        let mut url = self.endpoint("api/products")?;
        url.query_pairs_mut().append_pair("category", category);
        match self.get_json::<Vec<Product>>(url, "products").await {
            Ok(products) => {
                self.inner
                    .cache
                    .insert(key, CacheValue::Products(products.clone()))
                    .await;
                Ok(products)
            }
            Err(e) => self.fallback(e, || demo::demo_products_in(category)),
        }
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if neither the backend nor (when falling
    /// back) the demo catalog knows the product.
    #[instrument(skip(self))]
    pub async fn product(&self, id: &str) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.to_string());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("api/products/{id}"))?;
        match self.get_json::<Product>(url, &format!("product {id}")).await {
            Ok(product) => {
                self.inner
                    .cache
                    .insert(key, CacheValue::Product(Box::new(product.clone())))
                    .await;
                Ok(product)
            }
            Err(e) => self
                .fallback(e, || demo::demo_product(id))?
                .ok_or_else(|| ApiError::NotFound(format!("product {id}"))),
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures and non-success responses.
    #[instrument(skip(self, order), fields(lines = order.items.len()))]
    pub async fn checkout(&self, order: &OrderRequest) -> Result<OrderReceipt, ApiError> {
        let url = self.endpoint("api/checkout")?;
        let response = self.inner.client.post(url).json(order).send().await?;
        let response = ensure_success(response, "checkout").await?;

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(OrderReceipt::default());
        }
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            debug!(error = %e, "Unrecognised checkout response body");
            OrderReceipt::default()
        }))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, ApiError> {
        let response = self.inner.client.get(url).send().await?;
        let response = ensure_success(response, what).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn fallback<T>(&self, error: ApiError, demo: impl FnOnce() -> T) -> Result<T, ApiError> {
        if self.inner.offline_fallback && error.is_unavailable() {
            warn!(error = %error, "API not available, serving demo catalog");
            Ok(demo())
        } else {
            Err(error)
        }
    }
}

impl OrderGateway for ApiClient {
    fn submit_order(
        &self,
        order: &OrderRequest,
    ) -> impl Future<Output = Result<OrderReceipt, ApiError>> + Send {
        self.checkout(order)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("offline_fallback", &self.inner.offline_fallback)
            .finish_non_exhaustive()
    }
}
