//! Back-office REST client.
//!
//! # Endpoints
//!
//! - `POST   api/admin/login` - Exchange credentials for a bearer token
//! - `GET    api/admin/products` - All products
//! - `POST   api/admin/products` - Create a product (multipart)
//! - `PUT    api/admin/products/{id}` - Update a product (multipart)
//! - `DELETE api/admin/products/{id}` - Delete a product
//! - `GET    api/admin/orders` - All orders
//! - `GET    api/admin/users` - All users
//!
//! The bearer token lives in memory and under the `adminToken` storage key,
//! so a later process can resume the session with
//! [`AdminClient::restore_session`].

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use souk_core::{Order, Product, ProductId, User};
use souk_storefront::api::{demo::demo_products, ensure_success, http_client};
use souk_storefront::storage::ADMIN_TOKEN_STORAGE_KEY;
use souk_storefront::{ApiError, StorageArea, StorefrontConfig};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use url::Url;

use crate::demo::{demo_orders, demo_users};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::{AdminError, ProductForm};

/// Login response from the backend.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardSummary {
    pub total_products: usize,
    pub total_orders: usize,
    pub total_users: usize,
}

/// Back-office client.
///
/// Cloning is cheap; clones share the session.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    base_url: Url,
    offline_fallback: bool,
    storage: Arc<dyn StorageArea>,
    token: RwLock<Option<SecretString>>,
}

impl AdminClient {
    /// Create a client without a session.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Api` if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig, storage: Arc<dyn StorageArea>) -> Result<Self, AdminError> {
        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client: http_client(config)?,
                base_url: config.api_base_url.clone(),
                offline_fallback: config.offline_fallback,
                storage,
                token: RwLock::new(None),
            }),
        })
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in and persist the returned token.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidCredentials` if the backend rejects the
    /// login, or `AdminError::Api`/`AdminError::Storage` on failure.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), AdminError> {
        let url = self.endpoint("api/admin/login")?;
        let body = serde_json::json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let response = self
            .inner
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from)?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            warn!("Admin login rejected");
            return Err(AdminError::InvalidCredentials);
        }

        let response = ensure_success(response, "admin login").await?;
        let body = response.text().await.map_err(ApiError::from)?;
        let login: LoginResponse = serde_json::from_str(&body).map_err(ApiError::from)?;

        self.inner
            .storage
            .set_item(ADMIN_TOKEN_STORAGE_KEY, &login.token)?;
        *self.inner.token.write().await = Some(SecretString::from(login.token));

        set_sentry_user(username);
        info!("Admin logged in");
        Ok(())
    }

    /// Drop the session from memory and storage.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the stored token cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AdminError> {
        *self.inner.token.write().await = None;
        self.inner.storage.remove_item(ADMIN_TOKEN_STORAGE_KEY)?;
        clear_sentry_user();
        info!("Admin logged out");
        Ok(())
    }

    /// Reload a previously persisted token. Returns whether one was found.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if storage cannot be read.
    pub async fn restore_session(&self) -> Result<bool, AdminError> {
        let stored = self
            .inner
            .storage
            .get_item(ADMIN_TOKEN_STORAGE_KEY)?
            .filter(|token| !token.trim().is_empty());
        let found = stored.is_some();
        *self.inner.token.write().await = stored.map(SecretString::from);
        Ok(found)
    }

    pub async fn is_logged_in(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// List every product, including unpublished ones.
    ///
    /// # Errors
    ///
    /// Returns `AdminError` if not logged in or the request fails without
    /// fallback.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, AdminError> {
        let result = self.get_authed("api/admin/products", "products").await;
        self.fallback(result, demo_products)
    }

    /// List every order.
    ///
    /// # Errors
    ///
    /// Returns `AdminError` if not logged in or the request fails without
    /// fallback.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, AdminError> {
        let result = self.get_authed("api/admin/orders", "orders").await;
        self.fallback(result, demo_orders)
    }

    /// List every user account.
    ///
    /// # Errors
    ///
    /// Returns `AdminError` if not logged in or the request fails without
    /// fallback.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<User>, AdminError> {
        let result = self.get_authed("api/admin/users", "users").await;
        self.fallback(result, demo_users)
    }

    /// Product, order and user counts, fetched concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error among the three listings.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardSummary, AdminError> {
        let (products, orders, users) =
            tokio::try_join!(self.products(), self.orders(), self.users())?;
        Ok(DashboardSummary {
            total_products: products.len(),
            total_orders: orders.len(),
            total_users: users.len(),
        })
    }

    // =========================================================================
    // Product management
    // =========================================================================

    /// Create a product. Returns the created record when the backend echoes it.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` before sending an invalid form, or
    /// any request error. Never falls back.
    #[instrument(skip(self, form), fields(title = %form.title))]
    pub async fn create_product(&self, form: &ProductForm) -> Result<Option<Product>, AdminError> {
        form.validate()?;
        let url = self.endpoint("api/admin/products")?;
        let request = self.inner.client.post(url).multipart(form.to_multipart()?);
        let body = self.send_authed(request, "product").await?;
        info!("Product created");
        Ok(parse_product(&body))
    }

    /// Replace a product's fields (and image, if one is attached).
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation`, `ApiError::NotFound` for an unknown
    /// product, or any request error. Never falls back.
    #[instrument(skip(self, form), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        form: &ProductForm,
    ) -> Result<Option<Product>, AdminError> {
        form.validate()?;
        let url = self.endpoint(&format!("api/admin/products/{id}"))?;
        let request = self.inner.client.put(url).multipart(form.to_multipart()?);
        let body = self
            .send_authed(request, &format!("product {id}"))
            .await?;
        info!("Product updated");
        Ok(parse_product(&body))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown product, or any request
    /// error. Never falls back.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), AdminError> {
        let url = self.endpoint(&format!("api/admin/products/{id}"))?;
        let request = self.inner.client.delete(url);
        self.send_authed(request, &format!("product {id}")).await?;
        info!("Product deleted");
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn endpoint(&self, path: &str) -> Result<Url, AdminError> {
        Ok(self.inner.base_url.join(path).map_err(ApiError::from)?)
    }

    async fn get_authed<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, AdminError> {
        let url = self.endpoint(path)?;
        let body = self.send_authed(self.inner.client.get(url), what).await?;
        Ok(serde_json::from_str(&body).map_err(ApiError::from)?)
    }

    /// Attach the bearer token, send, and return the body of a 2xx response.
    ///
    /// A 401 ends the session.
    async fn send_authed(&self, request: RequestBuilder, what: &str) -> Result<String, AdminError> {
        let token = self
            .inner
            .token
            .read()
            .await
            .clone()
            .ok_or(AdminError::NotLoggedIn)?;

        let response = request
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(ApiError::from)?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                warn!("Admin token rejected, ending session");
                self.logout().await?;
                return Err(AdminError::Unauthorized(
                    "session expired, log in again".to_string(),
                ));
            }
            StatusCode::FORBIDDEN => {
                return Err(AdminError::Unauthorized("access denied".to_string()));
            }
            _ => {}
        }

        let response = ensure_success(response, what).await?;
        Ok(response.text().await.map_err(ApiError::from)?)
    }

    fn fallback<T>(
        &self,
        result: Result<T, AdminError>,
        demo: impl FnOnce() -> T,
    ) -> Result<T, AdminError> {
        match result {
            Err(AdminError::Api(e)) if self.inner.offline_fallback && e.is_unavailable() => {
                warn!(error = %e, "API not available, serving demo data");
                Ok(demo())
            }
            other => other,
        }
    }
}

/// Accept either a bare product or `{"product": {...}}`.
fn parse_product(body: &str) -> Option<Product> {
    #[derive(Deserialize)]
    struct Wrapped {
        product: Product,
    }

    serde_json::from_str::<Product>(body)
        .ok()
        .or_else(|| serde_json::from_str::<Wrapped>(body).ok().map(|w| w.product))
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("offline_fallback", &self.inner.offline_fallback)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use souk_storefront::MemoryStorage;

    use super::*;

    fn client(storage: &MemoryStorage) -> AdminClient {
        let config = StorefrontConfig::for_base_url(Url::parse("http://127.0.0.1:9").unwrap());
        AdminClient::new(&config, Arc::new(storage.clone())).unwrap()
    }

    #[tokio::test]
    async fn test_restore_session() {
        let storage = MemoryStorage::new();
        let admin = client(&storage);
        assert!(!admin.restore_session().await.unwrap());
        assert!(!admin.is_logged_in().await);

        storage.set_item(ADMIN_TOKEN_STORAGE_KEY, "tok-123").unwrap();
        assert!(admin.restore_session().await.unwrap());
        assert!(admin.is_logged_in().await);

        admin.logout().await.unwrap();
        assert!(!admin.is_logged_in().await);
        assert!(storage.get_item(ADMIN_TOKEN_STORAGE_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reads_require_session() {
        let admin = client(&MemoryStorage::new());
        assert!(matches!(admin.orders().await, Err(AdminError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_sent() {
        let storage = MemoryStorage::new();
        storage.set_item(ADMIN_TOKEN_STORAGE_KEY, "tok").unwrap();
        let admin = client(&storage);
        admin.restore_session().await.unwrap();

        let err = admin.create_product(&ProductForm::default()).await.unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
    }

    #[test]
    fn test_parse_product_shapes() {
        let bare = r#"{"id":"9","title":"Hat","price":12.5}"#;
        assert_eq!(parse_product(bare).unwrap().title, "Hat");

        let wrapped = r#"{"message":"created","product":{"id":"9","title":"Hat","price":12.5}}"#;
        assert_eq!(parse_product(wrapped).unwrap().id.as_str(), "9");

        assert!(parse_product(r#"{"message":"ok"}"#).is_none());
    }
}
