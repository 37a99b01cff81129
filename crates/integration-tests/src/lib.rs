//! Integration test support for the Eden Shop storefront client.
//!
//! [`MockBackend`] is an in-process axum server speaking the storefront REST
//! API closely enough to drive the client end to end: credential issuance and
//! refresh, the current-user endpoint, and guest/customer carts. It records
//! every request so tests can assert on what the client actually sent.
//!
//! [`TestContext`] wires a client against it the same way the CLI does, with
//! in-memory storage so a test can also "restart" the client over the same
//! persisted state.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p edenshop-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use edenshop_core::{CartId, CartItemId, Price, ProductId, SellerId, UserId, UserRole};
use edenshop_storefront::api::{
    ApiClient, AuthResponse, Cart, CartItem, CredentialVault, LoginRedirect, Product, User,
};
use edenshop_storefront::config::StorefrontConfig;
use edenshop_storefront::storage::{MemoryStorage, Storage};
use edenshop_storefront::stores::{CartStore, SessionStore};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;

/// Email of the account the mock backend knows about.
pub const CUSTOMER_EMAIL: &str = "ana@example.com";
/// Password of that account.
pub const CUSTOMER_PASSWORD: &str = "correct-horse";
/// Id of that account.
pub const CUSTOMER_ID: &str = "u-1";

/// Access credential issued by login.
pub const LOGIN_ACCESS_TOKEN: &str = "access-1";
/// Refresh credential issued by login.
pub const LOGIN_REFRESH_TOKEN: &str = "refresh-1";
/// Access credential issued by a successful refresh.
pub const REFRESHED_ACCESS_TOKEN: &str = "access-2";

/// Install a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edenshop_storefront=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Recorded traffic
// =============================================================================

/// One request as the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub bearer: Option<String>,
    pub session_id: Option<String>,
}

// =============================================================================
// Backend state
// =============================================================================

struct Line {
    id: CartItemId,
    product_id: ProductId,
    quantity: u32,
}

/// Mutable state behind the mock backend. Tests reach it through [`MockBackend`].
pub struct BackendState {
    valid_access: Mutex<Option<String>>,
    refresh_succeeds: AtomicBool,
    refresh_grants_access: AtomicBool,
    current_user_fails: AtomicBool,
    refresh_calls: AtomicUsize,
    next_item: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
    products: HashMap<ProductId, Product>,
    carts: Mutex<HashMap<String, Vec<Line>>>,
}

impl BackendState {
    fn new(products: Vec<Product>) -> Self {
        Self {
            valid_access: Mutex::new(None),
            refresh_succeeds: AtomicBool::new(true),
            refresh_grants_access: AtomicBool::new(true),
            current_user_fails: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            next_item: AtomicUsize::new(1),
            requests: Mutex::new(Vec::new()),
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
            carts: Mutex::new(HashMap::new()),
        }
    }

    fn render_cart(&self, scope: &str) -> Cart {
        let carts = self.carts.lock();
        let items = carts
            .get(scope)
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(|line| {
                        self.products.get(&line.product_id).map(|product| CartItem {
                            id: line.id.clone(),
                            cart_id: CartId::new(scope),
                            product: product.clone(),
                            quantity: line.quantity,
                            created_at: None,
                            updated_at: None,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (user_id, session_id) = match scope.split_once(':') {
            Some(("user", id)) => (Some(UserId::new(id)), None),
            Some((_, id)) => (None, Some(id.to_string())),
            None => (None, None),
        };

        Cart {
            id: CartId::new(scope),
            user_id,
            session_id,
            items,
            expires_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// The account the backend authenticates.
#[must_use]
pub fn customer() -> User {
    User {
        id: UserId::new(CUSTOMER_ID),
        email: Some(CUSTOMER_EMAIL.to_string()),
        phone: None,
        first_name: Some("Ana".to_string()),
        last_name: Some("Rojas".to_string()),
        role: UserRole::Customer,
        is_active: true,
        created_at: None,
        updated_at: None,
    }
}

/// A product the backend sells.
#[must_use]
pub fn product(id: &str, title: &str, cents: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        seller_id: SellerId::new("s-1"),
        title: title.to_string(),
        description: None,
        price: Price::from_cents(cents),
        stock,
        category: Some("Fertilizers".to_string()),
        image_urls: Vec::new(),
        is_active: true,
        is_featured: false,
        created_at: None,
        updated_at: None,
    }
}

/// The default catalog: humus at 10.00 (stock 10) and worms at 5.50 (stock 3).
#[must_use]
pub fn default_products() -> Vec<Product> {
    vec![
        product("p-humus", "Worm Humus 5kg", 1000, 10),
        product("p-worms", "Red Wigglers 500g", 550, 3),
    ]
}

// =============================================================================
// Errors
// =============================================================================

struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({
            "message": self.message,
            "status": self.status.as_u16(),
            "timestamp": "2024-05-01T12:00:00",
        });
        (self.status, Json(body)).into_response()
    }
}

type Shared = State<Arc<BackendState>>;

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsBody {
    email: Option<String>,
    phone: Option<String>,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionQuery {
    session_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody {
    product_id: ProductId,
    quantity: u32,
    session_id: Option<String>,
}

#[derive(Deserialize)]
struct QuantityBody {
    quantity: u32,
}

fn issue(state: &BackendState, user: User) -> Json<AuthResponse> {
    *state.valid_access.lock() = Some(LOGIN_ACCESS_TOKEN.to_string());
    Json(AuthResponse {
        token: LOGIN_ACCESS_TOKEN.to_string(),
        refresh_token: LOGIN_REFRESH_TOKEN.to_string(),
        user,
    })
}

async fn login(
    State(state): Shared,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<AuthResponse>, ApiFailure> {
    if body.email.as_deref() == Some(CUSTOMER_EMAIL) && body.password == CUSTOMER_PASSWORD {
        Ok(issue(&state, customer()))
    } else {
        Err(ApiFailure::unauthorized("Invalid credentials"))
    }
}

async fn register(
    State(state): Shared,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<AuthResponse>, ApiFailure> {
    if body.email.as_deref() == Some(CUSTOMER_EMAIL) {
        return Err(ApiFailure::new(StatusCode::CONFLICT, "Email already registered"));
    }
    let user = User {
        id: UserId::new("u-2"),
        email: body.email,
        phone: body.phone,
        first_name: None,
        last_name: None,
        ..customer()
    };
    Ok(issue(&state, user))
}

async fn refresh(
    State(state): Shared,
    Json(body): Json<RefreshBody>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if state.refresh_succeeds.load(Ordering::SeqCst) && body.refresh_token == LOGIN_REFRESH_TOKEN {
        if state.refresh_grants_access.load(Ordering::SeqCst) {
            *state.valid_access.lock() = Some(REFRESHED_ACCESS_TOKEN.to_string());
        }
        Ok(Json(json!({ "token": REFRESHED_ACCESS_TOKEN })))
    } else {
        Err(ApiFailure::unauthorized("Invalid refresh token"))
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Resolve whose cart a request addresses, rejecting stale credentials.
fn cart_scope(
    state: &BackendState,
    headers: &HeaderMap,
    session_id: Option<String>,
) -> Result<String, ApiFailure> {
    match bearer(headers) {
        Some(token) if state.valid_access.lock().as_deref() == Some(token.as_str()) => {
            Ok(format!("user:{CUSTOMER_ID}"))
        }
        Some(_) => Err(ApiFailure::unauthorized("Token expired")),
        None => session_id
            .map(|id| format!("guest:{id}"))
            .ok_or_else(|| ApiFailure::new(StatusCode::BAD_REQUEST, "sessionId is required")),
    }
}

async fn me(State(state): Shared, headers: HeaderMap) -> Result<Json<User>, ApiFailure> {
    if state.current_user_fails.load(Ordering::SeqCst) {
        return Err(ApiFailure::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "User service unavailable",
        ));
    }
    match cart_scope(&state, &headers, None) {
        Ok(_) => Ok(Json(customer())),
        Err(_) => Err(ApiFailure::unauthorized("Token expired")),
    }
}

async fn get_cart(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Cart>, ApiFailure> {
    let scope = cart_scope(&state, &headers, query.session_id)?;
    Ok(Json(state.render_cart(&scope)))
}

async fn add_item(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
    Json(body): Json<AddItemBody>,
) -> Result<Json<Cart>, ApiFailure> {
    let scope = cart_scope(&state, &headers, query.session_id.or(body.session_id))?;
    let product = state
        .products
        .get(&body.product_id)
        .ok_or_else(|| ApiFailure::new(StatusCode::NOT_FOUND, "Product not found"))?;

    {
        let mut carts = state.carts.lock();
        let lines = carts.entry(scope.clone()).or_default();
        let existing = lines.iter().position(|l| l.product_id == body.product_id);
        let current = existing.and_then(|i| lines.get(i)).map_or(0, |l| l.quantity);
        if current + body.quantity > product.stock {
            return Err(ApiFailure::new(StatusCode::BAD_REQUEST, "Insufficient stock"));
        }
        match existing.and_then(|i| lines.get_mut(i)) {
            Some(line) => line.quantity += body.quantity,
            None => {
                let n = state.next_item.fetch_add(1, Ordering::SeqCst);
                lines.push(Line {
                    id: CartItemId::new(format!("item-{n}")),
                    product_id: body.product_id,
                    quantity: body.quantity,
                });
            }
        }
    }

    Ok(Json(state.render_cart(&scope)))
}

async fn update_item(
    State(state): Shared,
    headers: HeaderMap,
    Path(item_id): Path<String>,
    Query(query): Query<SessionQuery>,
    Json(body): Json<QuantityBody>,
) -> Result<Json<Cart>, ApiFailure> {
    let scope = cart_scope(&state, &headers, query.session_id)?;
    {
        let mut carts = state.carts.lock();
        let line = carts
            .get_mut(&scope)
            .and_then(|lines| lines.iter_mut().find(|l| l.id.as_str() == item_id))
            .ok_or_else(|| ApiFailure::new(StatusCode::NOT_FOUND, "Cart item not found"))?;
        line.quantity = body.quantity;
    }
    Ok(Json(state.render_cart(&scope)))
}

async fn remove_item(
    State(state): Shared,
    headers: HeaderMap,
    Path(item_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Cart>, ApiFailure> {
    let scope = cart_scope(&state, &headers, query.session_id)?;
    if let Some(lines) = state.carts.lock().get_mut(&scope) {
        lines.retain(|l| l.id.as_str() != item_id);
    }
    Ok(Json(state.render_cart(&scope)))
}

async fn clear_cart(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Result<StatusCode, ApiFailure> {
    let scope = cart_scope(&state, &headers, query.session_id)?;
    state.carts.lock().remove(&scope);
    Ok(StatusCode::NO_CONTENT)
}

async fn record(State(state): Shared, request: Request, next: Next) -> Response {
    let session_id = request.uri().query().and_then(|q| {
        q.split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == "sessionId")
            .map(|(_, v)| v.to_string())
    });
    state.requests.lock().push(RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        bearer: bearer(request.headers()),
        session_id,
    });
    next.run(request).await
}

fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/users/me", get(me))
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_item))
        .route("/api/cart/items/{id}", put(update_item).delete(remove_item))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

// =============================================================================
// Harness
// =============================================================================

/// Handle to a running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub base_url: String,
    state: Arc<BackendState>,
}

impl MockBackend {
    /// Start the backend on an ephemeral port with [`default_products`].
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        Self::start_with(default_products()).await
    }

    /// Start the backend selling `products`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start_with(products: Vec<Product>) -> Self {
        let state = Arc::new(BackendState::new(products));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let app = router(state.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Invalidate the current access credential, as if it expired.
    pub fn expire_access_token(&self) {
        *self.state.valid_access.lock() = Some("expired-elsewhere".to_string());
    }

    /// Make `POST /auth/refresh` succeed or fail.
    pub fn set_refresh_succeeds(&self, succeeds: bool) {
        self.state.refresh_succeeds.store(succeeds, Ordering::SeqCst);
    }

    /// Make a successful refresh hand out a credential the backend still rejects.
    pub fn set_refresh_grants_access(&self, grants: bool) {
        self.state.refresh_grants_access.store(grants, Ordering::SeqCst);
    }

    /// Make `GET /users/me` answer with a 500.
    pub fn set_current_user_fails(&self, fails: bool) {
        self.state.current_user_fails.store(fails, Ordering::SeqCst);
    }

    /// Number of refresh calls received.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Requests received for `method path`.
    #[must_use]
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Put a line straight into a cart, bypassing the API, as another device would.
    pub fn insert_line(&self, scope: &str, item_id: &str, product_id: &str, quantity: u32) {
        self.state
            .carts
            .lock()
            .entry(scope.to_string())
            .or_default()
            .push(Line {
                id: CartItemId::new(item_id),
                product_id: ProductId::new(product_id),
                quantity,
            });
    }
}

/// Records forced logouts.
#[derive(Default)]
pub struct RecordingRedirect {
    paths: Mutex<Vec<String>>,
}

impl RecordingRedirect {
    /// Login paths the client was sent to, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }

    /// Number of redirects.
    #[must_use]
    pub fn count(&self) -> usize {
        self.paths.lock().len()
    }
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        self.paths.lock().push(login_path.to_string());
    }
}

/// A client wired against a [`MockBackend`].
pub struct TestContext {
    pub backend: MockBackend,
    pub storage: MemoryStorage,
    pub api: ApiClient,
    pub session: SessionStore,
    pub cart: CartStore,
    pub redirects: Arc<RecordingRedirect>,
}

impl TestContext {
    /// Start a backend and a fresh client.
    pub async fn start() -> Self {
        init_tracing();
        let backend = MockBackend::start().await;
        Self::connect(backend, MemoryStorage::new()).await
    }

    /// Wire a client over `storage`, restoring whatever it holds.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub async fn connect(backend: MockBackend, storage: MemoryStorage) -> Self {
        let config =
            StorefrontConfig::for_api_url(&backend.base_url).expect("Mock backend URL is valid");
        let shared: Arc<dyn Storage> = Arc::new(storage.clone());
        let redirects = Arc::new(RecordingRedirect::default());
        let vault = Arc::new(CredentialVault::new(shared.clone()));
        let api = ApiClient::new(&config, vault, redirects.clone()).expect("HTTP client builds");

        let session = SessionStore::restore(api.clone(), shared.clone()).await;
        let cart = CartStore::restore(api.clone(), shared).await;

        Self {
            backend,
            storage,
            api,
            session,
            cart,
            redirects,
        }
    }

    /// A new client over the same backend and persisted state, as after a restart.
    pub async fn restart(&self) -> Self {
        Self::connect(self.backend.clone(), self.storage.clone()).await
    }

    /// Log in as [`CUSTOMER_EMAIL`].
    ///
    /// # Panics
    ///
    /// Panics if the backend rejects the login.
    pub async fn login(&self) -> User {
        self.session
            .login(CUSTOMER_EMAIL, CUSTOMER_PASSWORD)
            .await
            .expect("Customer login succeeds")
    }
}
