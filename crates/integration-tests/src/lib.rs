//! Integration tests for Shopfront cart, wishlist and order sync.
//!
//! Tests run the real [`ApiClient`](shopfront_storefront::api::ApiClient)
//! against [`FakeBackend`], an in-process axum server speaking the same REST
//! dialect as the Shopfront backend. No external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! # Everything except live-backend tests
//! cargo test -p shopfront-integration-tests
//!
//! # Live-backend tests (needs STOREFRONT_API_URL and test credentials)
//! cargo test -p shopfront-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use shopfront_core::{
    CartItem, CartItemId, Category, CategoryId, Order, OrderDetails, OrderId, OrderItem,
    OrderItemId, OrderStatus, PaymentStatus, Product, ProductId, WishlistItem, WishlistItemId,
    cart_total, effective_unit_price, round_money,
};
use shopfront_storefront::config::{ApiConfig, StorefrontConfig};
use shopfront_storefront::notify::{ChannelNotifier, Notice};
use shopfront_storefront::state::AppState;
use shopfront_storefront::storage::{LocalStorage, MemoryStorage};

/// Password the fake backend accepts for any email.
pub const TEST_PASSWORD: &str = "correct-horse";

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Default)]
struct BackendState {
    products: HashMap<String, Product>,
    cart: Vec<CartItem>,
    wishlist: Vec<WishlistItem>,
    orders: Vec<OrderDetails>,
    next_id: i64,
    access_token: Option<String>,
    refresh_token: Option<String>,
    tokens_issued: u32,
    fail_next: Option<StatusCode>,
    hits: Vec<String>,
}

impl BackendState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn issue_access(&mut self) -> String {
        self.tokens_issued += 1;
        let token = format!("access-{}", self.tokens_issued);
        self.access_token = Some(token.clone());
        token
    }

    /// Record the hit, then apply injected failures and bearer auth.
    fn guard(&mut self, headers: &HeaderMap, hit: &str) -> Result<(), Response> {
        self.hits.push(hit.to_string());

        if let Some(status) = self.fail_next.take() {
            return Err(detail(status, "Injected failure"));
        }

        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match (bearer, self.access_token.as_deref()) {
            (Some(sent), Some(valid)) if sent == valid => Ok(()),
            _ => Err(detail(
                StatusCode::UNAUTHORIZED,
                "Given token not valid for any token type",
            )),
        }
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

type Shared = Arc<Mutex<BackendState>>;

/// In-process stand-in for the Shopfront REST backend.
pub struct FakeBackend {
    state: Shared,
    addr: SocketAddr,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state, addr }
    }

    /// Base URL clients should use.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a product to the catalog.
    pub fn add_product(&self, product: Product) {
        self.lock().products.insert(product.slug.clone(), product);
    }

    /// Make the next request fail with `status`.
    pub fn fail_next(&self, status: StatusCode) {
        self.lock().fail_next = Some(status);
    }

    /// Invalidate the current access token; the refresh token stays valid.
    pub fn expire_access_token(&self) {
        self.lock().access_token = Some("expired".to_string());
    }

    /// Invalidate the refresh token too.
    pub fn revoke_refresh_token(&self) {
        self.lock().refresh_token = None;
    }

    /// Requests received so far, as `"METHOD path"`.
    #[must_use]
    pub fn hits(&self) -> Vec<String> {
        self.lock().hits.clone()
    }

    /// Number of requests whose hit label contains `needle`.
    #[must_use]
    pub fn count(&self, needle: &str) -> usize {
        self.lock().hits.iter().filter(|h| h.contains(needle)).count()
    }

    /// Server-side cart lines.
    #[must_use]
    pub fn cart(&self) -> Vec<CartItem> {
        self.lock().cart.clone()
    }

    /// Placed orders, oldest first.
    #[must_use]
    pub fn orders(&self) -> Vec<OrderDetails> {
        self.lock().orders.clone()
    }

    /// Move an order along, as fulfilment would.
    pub fn set_order_status(&self, order_id: OrderId, status: OrderStatus) {
        if let Some(details) = self
            .lock()
            .orders
            .iter_mut()
            .find(|d| d.order.id == order_id)
        {
            details.order.status = status;
        }
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/v1/accounts/token/", post(login))
        .route("/api/v1/accounts/token/refresh/", post(refresh))
        .route("/api/v1/products/products/{slug}/", get(product_by_slug))
        .route("/api/v1/cart/cart/my-cart/", get(my_cart))
        .route("/api/v1/cart/cart/add-item/", post(cart_add))
        .route(
            "/api/v1/cart/cart-items/{id}/update-quantity/",
            patch(cart_update_quantity),
        )
        .route("/api/v1/cart/cart-items/{id}/remove/", delete(cart_remove))
        .route("/api/v1/cart/cart/clear/", delete(cart_clear))
        .route("/api/v1/wishlist/wishlist/my-wishlist/", get(my_wishlist))
        .route("/api/v1/wishlist/wishlist/add-item/", post(wishlist_add))
        .route(
            "/api/v1/wishlist/wishlist-items/{id}/remove/",
            delete(wishlist_remove),
        )
        .route("/api/v1/wishlist/wishlist/clear/", delete(wishlist_clear))
        .route("/api/v1/orders/orders/", post(order_create))
        .route("/api/v1/orders/orders/my-orders/", get(my_orders))
        .route("/api/v1/orders/orders/{id}/", get(order_detail))
        .route("/api/v1/orders/orders/{id}/cancel/", post(order_cancel))
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginBody {
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    s.hits.push("POST token".to_string());
    if body.password != TEST_PASSWORD {
        return detail(
            StatusCode::UNAUTHORIZED,
            "No active account found with the given credentials",
        );
    }
    let access = s.issue_access();
    s.refresh_token = Some("refresh-token".to_string());
    Json(json!({ "access": access, "refresh": "refresh-token" })).into_response()
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

async fn refresh(State(state): State<Shared>, Json(body): Json<RefreshBody>) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    s.hits.push("POST refresh".to_string());
    if s.refresh_token.as_deref() != Some(body.refresh.as_str()) {
        return detail(StatusCode::UNAUTHORIZED, "Token is invalid or expired");
    }
    let access = s.issue_access();
    Json(json!({ "access": access })).into_response()
}

async fn product_by_slug(State(state): State<Shared>, Path(slug): Path<String>) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    s.hits.push(format!("GET product {slug}"));
    match s.products.get(&slug) {
        Some(product) => Json(product.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "No Product matches the given query."),
    }
}

async fn my_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "GET my-cart") {
        return r;
    }
    Json(json!({ "items": s.cart })).into_response()
}

#[derive(Deserialize)]
struct CartAddBody {
    product_id: ProductId,
    quantity: u32,
}

async fn cart_add(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartAddBody>,
) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "POST cart add-item") {
        return r;
    }

    // One line per product: adding an existing product bumps its line.
    if let Some(line) = s.cart.iter_mut().find(|l| l.product_id == body.product_id) {
        line.quantity += body.quantity;
        return Json(json!({ "items": s.cart })).into_response();
    }

    let Some(product) = s
        .products
        .values()
        .find(|p| p.id == body.product_id)
        .cloned()
    else {
        return detail(StatusCode::BAD_REQUEST, "Product not found");
    };
    let id = s.next_id();
    s.cart.push(CartItem {
        id: CartItemId::new(id),
        product_id: product.id,
        name: product.name.clone(),
        slug: product.slug.clone(),
        price: product.price,
        discount_price: product.discount_price,
        quantity: body.quantity,
        selected_size: None,
        selected_color: None,
        image: product.primary_image().map(str::to_string),
    });
    Json(json!({ "items": s.cart })).into_response()
}

#[derive(Deserialize)]
struct QuantityBody {
    quantity: u32,
}

async fn cart_update_quantity(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CartItemId>,
    Json(body): Json<QuantityBody>,
) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "PATCH cart update-quantity") {
        return r;
    }
    match s.cart.iter_mut().find(|l| l.id == id) {
        Some(line) => {
            line.quantity = body.quantity;
            Json(line.clone()).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Not found."),
    }
}

async fn cart_remove(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CartItemId>,
) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "DELETE cart remove") {
        return r;
    }
    s.cart.retain(|l| l.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn cart_clear(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "DELETE cart clear") {
        return r;
    }
    s.cart.clear();
    StatusCode::NO_CONTENT.into_response()
}

async fn my_wishlist(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "GET my-wishlist") {
        return r;
    }
    Json(json!({ "items": s.wishlist })).into_response()
}

#[derive(Deserialize)]
struct WishlistAddBody {
    product_id: ProductId,
}

async fn wishlist_add(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<WishlistAddBody>,
) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "POST wishlist add-item") {
        return r;
    }
    if s.wishlist.iter().any(|w| w.product.id == body.product_id) {
        return detail(StatusCode::BAD_REQUEST, "Product already in wishlist");
    }
    let Some(product) = s
        .products
        .values()
        .find(|p| p.id == body.product_id)
        .cloned()
    else {
        return detail(StatusCode::BAD_REQUEST, "Product not found");
    };
    let id = s.next_id();
    s.wishlist.push(WishlistItem {
        id: WishlistItemId::new(id),
        product,
        created_at: Utc::now(),
    });
    Json(json!({ "items": s.wishlist })).into_response()
}

async fn wishlist_remove(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<WishlistItemId>,
) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "DELETE wishlist remove") {
        return r;
    }
    s.wishlist.retain(|w| w.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn wishlist_clear(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "DELETE wishlist clear") {
        return r;
    }
    s.wishlist.clear();
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
struct NewOrderBody {
    shipping_address_id: i64,
    shipping_cost: Decimal,
}

async fn order_create(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewOrderBody>,
) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "POST orders") {
        return r;
    }
    if s.cart.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let lines: Vec<(CartItem, Product)> = s
        .cart
        .iter()
        .filter_map(|line| {
            s.products
                .values()
                .find(|p| p.id == line.product_id)
                .map(|p| (line.clone(), p.clone()))
        })
        .collect();
    let mut items = Vec::with_capacity(lines.len());
    for (line, product) in lines {
        let unit_price = effective_unit_price(line.price, line.discount_price);
        items.push(OrderItem {
            id: OrderItemId::new(s.next_id()),
            product,
            quantity: line.quantity,
            unit_price,
            total_price: unit_price * Decimal::from(line.quantity),
        });
    }

    let subtotal = cart_total(&s.cart);
    let tax = round_money(subtotal * Decimal::new(8, 2));
    let id = s.next_id();
    let now = Utc::now();
    let details = OrderDetails {
        order: Order {
            id: OrderId::new(id),
            order_number: format!("ORD-{id:04}"),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: String::new(),
            subtotal,
            shipping_cost: body.shipping_cost,
            tax,
            total: subtotal + body.shipping_cost + tax,
            created_at: now,
            updated_at: now,
        },
        items,
        shipping_name: "Sam Shopper".to_string(),
        shipping_address_line: format!("{} Test Street", body.shipping_address_id),
        shipping_city: "Springfield".to_string(),
        shipping_postal_code: "12345".to_string(),
        shipping_country: "US".to_string(),
    };
    s.orders.push(details.clone());
    (StatusCode::CREATED, Json(details)).into_response()
}

#[derive(Deserialize)]
struct PageQuery {
    page: usize,
    limit: usize,
}

async fn my_orders(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "GET my-orders") {
        return r;
    }
    let results: Vec<Order> = s
        .orders
        .iter()
        .rev()
        .skip(query.page.saturating_sub(1) * query.limit)
        .take(query.limit)
        .map(|d| d.order.clone())
        .collect();
    Json(json!({
        "count": s.orders.len(),
        "next": null,
        "previous": null,
        "results": results,
    }))
    .into_response()
}

async fn order_detail(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "GET order") {
        return r;
    }
    match s.orders.iter().find(|d| d.order.id == id) {
        Some(details) => Json(details.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Not found."),
    }
}

async fn order_cancel(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
) -> Response {
    let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(r) = s.guard(&headers, "POST order cancel") {
        return r;
    }
    let Some(details) = s.orders.iter_mut().find(|d| d.order.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Not found.");
    };
    if !details.order.status.is_cancellable() {
        return detail(
            StatusCode::BAD_REQUEST,
            "Only pending or processing orders can be cancelled",
        );
    }
    details.order.status = OrderStatus::Cancelled;
    details.order.updated_at = Utc::now();
    Json(details.order.clone()).into_response()
}

// =============================================================================
// Fixtures
// =============================================================================

/// A catalog product with sensible defaults.
#[must_use]
pub fn product(id: i64, slug: &str, price: &str, discount_price: Option<&str>) -> Product {
    Product {
        id: ProductId::new(id),
        name: slug.replace('-', " "),
        slug: slug.to_string(),
        description: format!("The {slug}."),
        category: Some(Category {
            id: CategoryId::new(1),
            name: "Apparel".to_string(),
            slug: "apparel".to_string(),
            description: None,
            is_active: true,
            image: None,
        }),
        price: price.parse::<Decimal>().unwrap(),
        discount_price: discount_price.map(|d| d.parse::<Decimal>().unwrap()),
        stock: 25,
        is_active: true,
        is_in_stock: true,
        images: Vec::new(),
        average_rating: 4.5,
        created_at: Some(Utc::now()),
    }
}

/// A client wired to a backend, with its notices and storage exposed.
pub struct TestClient {
    pub state: AppState,
    pub storage: Arc<MemoryStorage>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

impl TestClient {
    /// A fresh client with empty storage.
    #[must_use]
    pub fn new(backend: &FakeBackend) -> Self {
        Self::with_storage(backend, Arc::new(MemoryStorage::new()))
    }

    /// A client over existing storage, as after a restart.
    #[must_use]
    pub fn with_storage(backend: &FakeBackend, storage: Arc<MemoryStorage>) -> Self {
        let config = StorefrontConfig {
            api: ApiConfig::new(&backend.api_url()).unwrap(),
            data_dir: PathBuf::from("unused"),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let (notifier, notices) = ChannelNotifier::new();
        let shared: Arc<dyn LocalStorage> = storage.clone();
        let state = AppState::new(config, shared, Arc::new(notifier)).unwrap();

        Self {
            state,
            storage,
            notices,
        }
    }

    /// A logged-in client.
    pub async fn logged_in(backend: &FakeBackend) -> Self {
        let client = Self::new(backend);
        client.login().await;
        client
    }

    /// Log in with the test password.
    pub async fn login(&self) {
        self.state
            .api()
            .login(
                "shopper@example.com",
                &secrecy::SecretString::from(TEST_PASSWORD),
            )
            .await
            .unwrap();
    }

    /// Drain queued notice messages.
    pub fn notice_messages(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            messages.push(notice.message);
        }
        messages
    }
}
