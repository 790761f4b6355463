//! Integration tests for Doghouse.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p doghouse-integration-tests
//! ```
//!
//! Each test starts [`StubApi`], an in-process `axum` server on an ephemeral
//! port that behaves like the remote storefront API for one user, and points
//! a real [`Storefront`] at it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use doghouse_storefront::Storefront;
use doghouse_storefront::config::StorefrontConfig;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

pub const USERNAME: &str = "juan";
pub const PASSWORD: &str = "hunter2222";
pub const ACCESS_TOKEN: &str = "stub-access-token";
pub const REFRESH_TOKEN: &str = "stub-refresh-token";
pub const USER_ID: i32 = 7;

/// Debounce used by storefronts built with [`StubApi::storefront`].
pub const SYNC_DEBOUNCE: Duration = Duration::from_millis(100);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What the stub has stored and seen.
#[derive(Default)]
pub struct StubState {
    cart: Mutex<Vec<Value>>,
    cart_writes: Mutex<Vec<Vec<Value>>>,
    orders: Mutex<Vec<Value>>,
    profile: Mutex<Value>,
    request_ids: Mutex<Vec<String>>,
    checkout_failure: Mutex<Option<(StatusCode, Value)>>,
    product_reads: AtomicUsize,
    cart_reads: AtomicUsize,
    logouts: AtomicUsize,
}

impl StubState {
    /// The stored cart lines.
    pub fn cart(&self) -> Vec<Value> {
        lock(&self.cart).clone()
    }

    /// Replace the stored cart.
    pub fn set_cart(&self, items: Vec<Value>) {
        *lock(&self.cart) = items;
    }

    /// Every `POST /orders/cart/` body's `cart_items`, in arrival order.
    pub fn cart_writes(&self) -> Vec<Vec<Value>> {
        lock(&self.cart_writes).clone()
    }

    pub fn orders(&self) -> Vec<Value> {
        lock(&self.orders).clone()
    }

    pub fn profile(&self) -> Value {
        lock(&self.profile).clone()
    }

    /// `x-request-id` values seen, in arrival order.
    pub fn request_ids(&self) -> Vec<String> {
        lock(&self.request_ids).clone()
    }

    /// Make the next checkout fail with `status` and `body`.
    pub fn fail_next_checkout(&self, status: StatusCode, body: Value) {
        *lock(&self.checkout_failure) = Some((status, body));
    }

    pub fn product_reads(&self) -> usize {
        self.product_reads.load(Ordering::SeqCst)
    }

    /// Authorized `GET /orders/cart/` requests served.
    pub fn cart_reads(&self) -> usize {
        self.cart_reads.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

/// A running stub of the remote API.
pub struct StubApi {
    url: Url,
    state: Arc<StubState>,
    server: JoinHandle<()>,
}

impl StubApi {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(StubState {
            profile: Mutex::new(json!({
                "id": USER_ID,
                "username": USERNAME,
                "email": "juan@doghouse.ph",
                "first_name": "Juan",
                "last_name": "dela Cruz",
                "address": "12 Rizal Ave, Manila",
                "contact": "09171234567"
            })),
            ..StubState::default()
        });

        let app = Router::new()
            .route("/orders/products/", get(products))
            .route("/orders/cart/", get(fetch_cart).post(save_cart))
            .route("/orders/checkout/", post(checkout))
            .route("/orders/history/", get(history))
            .route("/users/login/", post(login))
            .route("/users/register/", post(register))
            .route("/users/logout/", post(logout))
            .route("/users/profile/", get(profile).put(update_profile))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                record_request_id,
            ))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub API listener");
        let addr = listener.local_addr().expect("Stub API has no local address");

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let url = Url::parse(&format!("http://{addr}/")).expect("Stub API URL is valid");
        Self { url, state, server }
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn state(&self) -> &StubState {
        &self.state
    }

    /// Storefront configuration pointing at this stub, with a short debounce.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let mut config = StorefrontConfig::with_base_url(self.url.clone());
        config.cart.sync_debounce = SYNC_DEBOUNCE;
        config.auth_check_delay = Duration::from_millis(10);
        config
    }

    /// A storefront wired to this stub.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        Storefront::new(self.config()).expect("Failed to build storefront")
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Poll `condition` every 10ms until it holds, for up to two seconds.
///
/// Returns whether it ever held.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Wait until the cart fetch that follows a login has been applied.
pub async fn cart_loaded(stub: &StubApi, storefront: &Storefront) -> bool {
    let cart = storefront.cart();
    eventually(|| stub.state().cart_reads() > 0 && !cart.state().is_loading()).await
}

/// A cart line as the remote API stores it.
#[must_use]
pub fn line(id: i32, name: &str, price: f64, quantity: u32) -> Value {
    json!({"id": id, "name": name, "price": price, "quantity": quantity, "emoji": "🌭"})
}

// =============================================================================
// Handlers
// =============================================================================

async fn record_request_id(
    State(state): State<Arc<StubState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(id) = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
    {
        lock(&state.request_ids).push(id.to_string());
    }
    next.run(request).await
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {ACCESS_TOKEN}");
    let ok = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if ok {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Authentication credentials were not provided."})),
        )
            .into_response())
    }
}

async fn products(State(state): State<Arc<StubState>>) -> Json<Value> {
    state.product_reads.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        {"id": 1, "name": "Hotdog", "price": 79.0, "image_file": "hotdog.png", "description": "Classic beef frank"},
        {"id": 2, "name": "Cheesy Dog", "price": 99.0, "image_file": "cheesy.png", "description": "With melted cheddar"},
        {"id": 3, "name": "Iced Tea", "price": 35.5, "image_file": null, "description": null}
    ]))
}

async fn fetch_cart(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    state.cart_reads.fetch_add(1, Ordering::SeqCst);
    Json(json!({"cart_items": state.cart()})).into_response()
}

async fn save_cart(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let items = body
        .get("cart_items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    lock(&state.cart_writes).push(items.clone());
    state.set_cart(items);
    Json(json!({"message": "Cart saved"})).into_response()
}

async fn checkout(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    if let Some((status, body)) = lock(&state.checkout_failure).take() {
        return (status, Json(body)).into_response();
    }

    let items = std::mem::take(&mut *lock(&state.cart));
    if items.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Cart is empty"})),
        )
            .into_response();
    }

    let order_items: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            json!({
                "id": index + 1,
                "product_name": item["name"],
                "quantity": item["quantity"],
                "price_at_purchase": item["price"]
            })
        })
        .collect();
    let total: f64 = items
        .iter()
        .map(|item| item["price"].as_f64().unwrap_or(0.0) * item["quantity"].as_f64().unwrap_or(0.0))
        .sum();

    let mut orders = lock(&state.orders);
    let id = orders.len() + 1;
    orders.push(json!({
        "id": id,
        "created_at": "2025-03-01T10:15:00.123456+08:00",
        "completed_at": "2025-03-01T10:15:00.123456+08:00",
        "total_price": total,
        "order_items": order_items
    }));

    Json(json!({"message": "Order placed successfully"})).into_response()
}

async fn history(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(Value::Array(state.orders())).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        Json(json!({
            "message": "Login successful",
            "access": ACCESS_TOKEN,
            "refresh": REFRESH_TOKEN,
            "user_id": USER_ID
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response()
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["username"] == USERNAME {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"username": ["A user with that username already exists."]})),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({"message": "User registered successfully"})),
    )
        .into_response()
}

async fn logout(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    state.logouts.fetch_add(1, Ordering::SeqCst);
    Json(json!({"message": "Logged out successfully"})).into_response()
}

async fn profile(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(state.profile()).into_response()
}

async fn update_profile(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    if body["current_password"] != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"current_password": ["Current password is incorrect."]})),
        )
            .into_response();
    }
    if body["contact"].as_str().is_some_and(|c| c.len() > 15) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"contact": ["Ensure this field has no more than 15 characters."]})),
        )
            .into_response();
    }

    let mut profile = lock(&state.profile);
    for field in ["username", "email", "first_name", "last_name", "address", "contact"] {
        if let Some(value) = body.get(field) {
            profile[field] = value.clone();
        }
    }
    Json(profile.clone()).into_response()
}
