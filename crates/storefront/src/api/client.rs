//! HTTP client for the remote storefront API.
//!
//! Caches the product list using `moka` (5-minute TTL). Everything else goes
//! straight to the server.

use std::sync::Arc;
use std::time::Duration;

use doghouse_core::LineItem;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::types::{
    CartPayload, CheckoutReceipt, LoginRequest, LoginResponse, MessageResponse, Order, Product,
    ProfileUpdate, RegisterRequest, UserProfile,
};
use super::{ApiError, CartApi};
use crate::config::ApiConfig;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const CART_PATH: &str = "orders/cart/";
const CHECKOUT_PATH: &str = "orders/checkout/";
const PRODUCTS_PATH: &str = "orders/products/";
const HISTORY_PATH: &str = "orders/history/";
const LOGIN_PATH: &str = "users/login/";
const REGISTER_PATH: &str = "users/register/";
const LOGOUT_PATH: &str = "users/logout/";
const PROFILE_PATH: &str = "users/profile/";

const PRODUCTS_CACHE_KEY: &str = "products";

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the remote storefront API.
///
/// Cheaply cloneable; clones share the connection pool and product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Cache<String, Arc<Vec<Product>>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let products = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                products,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build a request for `path` relative to the base URL.
    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Transport(format!("invalid URL for {path}: {e}")))?;

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        Ok(request)
    }

    /// Send a request and turn non-success statuses into [`ApiError`].
    async fn send(request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            debug!("Remote API rejected bearer token");
            return Err(ApiError::Unauthorized);
        }

        // Get response body as text first for better error diagnostics
        let text = response.text().await.unwrap_or_default();
        tracing::warn!(
            status = %status,
            body = %text.chars().take(500).collect::<String>(),
            "Remote API returned non-success status"
        );

        Err(ApiError::Api {
            status: status.as_u16(),
            body: serde_json::from_str(&text).unwrap_or(serde_json::Value::Null),
        })
    }

    /// Decode a JSON response body.
    async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse remote API response"
            );
            ApiError::Decode(e.to_string())
        })
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the stored cart for the token's user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<LineItem>, ApiError> {
        let request = self.request(Method::GET, CART_PATH, Some(token))?;
        let payload: CartPayload = Self::json(Self::send(request).await?).await?;
        debug!(items = payload.cart_items.len(), "Fetched remote cart");
        Ok(payload.cart_items)
    }

    /// Replace the stored cart with `items`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is rejected.
    #[instrument(skip(self, token, items), fields(items = items.len()))]
    pub async fn save_cart(
        &self,
        token: &SecretString,
        items: &[LineItem],
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "cart_items": items });
        let request = self
            .request(Method::POST, CART_PATH, Some(token))?
            .json(&body);
        Self::send(request).await?;
        Ok(())
    }

    /// Convert the stored cart into an order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the server rejects the checkout.
    #[instrument(skip(self, token))]
    pub async fn checkout(&self, token: &SecretString) -> Result<CheckoutReceipt, ApiError> {
        let request = self.request(Method::POST, CHECKOUT_PATH, Some(token))?;
        Self::json(Self::send(request).await?).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List all products. Cached for 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(products) = self.inner.products.get(PRODUCTS_CACHE_KEY).await {
            debug!("Product list cache hit");
            return Ok(products);
        }

        let request = self.request(Method::GET, PRODUCTS_PATH, None)?;
        let products: Arc<Vec<Product>> =
            Arc::new(Self::json(Self::send(request).await?).await?);

        self.inner
            .products
            .insert(PRODUCTS_CACHE_KEY.to_string(), Arc::clone(&products))
            .await;

        Ok(products)
    }

    /// Drop the cached product list so the next call refetches it.
    pub async fn invalidate_products(&self) {
        self.inner.products.invalidate(PRODUCTS_CACHE_KEY).await;
    }

    /// Completed orders for the token's user, newest first as sent.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn order_history(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        let request = self.request(Method::GET, HISTORY_PATH, Some(token))?;
        Self::json(Self::send(request).await?).await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Exchange a username and password for a bearer token pair.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .request(Method::POST, LOGIN_PATH, None)?
            .json(&LoginRequest { username, password });
        Self::json(Self::send(request).await?).await
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] with per-field errors when validation fails.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegisterRequest) -> Result<MessageResponse, ApiError> {
        let request = self.request(Method::POST, REGISTER_PATH, None)?.json(form);
        Self::json(Self::send(request).await?).await
    }

    /// Tell the server the session is over.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &SecretString) -> Result<(), ApiError> {
        let request = self.request(Method::POST, LOGOUT_PATH, Some(token))?;
        Self::send(request).await?;
        Ok(())
    }

    /// Fetch the account details for the token's user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &SecretString) -> Result<UserProfile, ApiError> {
        let request = self.request(Method::GET, PROFILE_PATH, Some(token))?;
        Self::json(Self::send(request).await?).await
    }

    /// Update the account details for the token's user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`] with per-field errors when validation fails.
    #[instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, PROFILE_PATH, Some(token))?
            .json(update);
        Self::send(request).await?;
        Ok(())
    }
}

impl CartApi for ApiClient {
    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<LineItem>, ApiError> {
        Self::fetch_cart(self, token).await
    }

    async fn save_cart(&self, token: &SecretString, items: &[LineItem]) -> Result<(), ApiError> {
        Self::save_cart(self, token, items).await
    }

    async fn checkout(&self, token: &SecretString) -> Result<CheckoutReceipt, ApiError> {
        Self::checkout(self, token).await
    }
}
