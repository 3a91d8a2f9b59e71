//! Shared test infrastructure
//!
//! Spawns a stub inventory backend on an ephemeral port and builds a gateway
//! router pointed at it. The stub serves canned catalog fixtures, records
//! every write in atomic counters, and has a couple of routes that imitate a
//! backend whose session expired (redirect / HTML answers).

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};
use pantry_common::config::GatewayConfig;
use pantry_gw::backend::BackendClient;
use pantry_gw::cache::MemoryCache;
use pantry_gw::{build_router, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mutable state behind the stub backend
pub struct StubState {
    pub products: Mutex<Vec<Value>>,
    pub shopping_lists: Mutex<Vec<Value>>,
    pub list_items: Mutex<Vec<Value>>,
    pub stock: Mutex<Vec<Value>>,
    pub details: Mutex<HashMap<i64, Value>>,
    pub locations: Vec<Value>,
    pub quantity_units: Vec<Value>,
    pub product_groups: Vec<Value>,
    pub stores: Vec<Value>,
    /// Write counters, for asserting what reached the backend
    pub stock_adds: AtomicUsize,
    pub price_posts: AtomicUsize,
    pub product_creates: AtomicUsize,
    pub list_item_posts: AtomicUsize,
    /// Read counter for the products collection (cache behavior assertions)
    pub product_fetches: AtomicUsize,
    next_product_id: AtomicUsize,
}

impl StubState {
    fn with_fixture() -> Self {
        let products = vec![
            json!({"id": 1, "name": "Milk", "location_id": 1, "qu_id_stock": 3}),
            json!({"id": 2, "name": "Milk Substitute", "location_id": 1}),
            json!({"id": 3, "name": "Apple Juice", "location_id": 1}),
            json!({"id": 4, "name": "Apple Sauce", "location_id": 1}),
            json!({"id": 5, "name": "Butter", "location_id": 2}),
            json!({"id": 6, "name": "Eggs", "location_id": 2}),
        ];

        let mut details = HashMap::new();
        details.insert(
            1,
            json!({
                "product": {"id": 1, "name": "Milk", "location_id": 1},
                "last_price": 1.29,
                "default_quantity_unit_purchase": {"id": 3, "name": "Liter"},
                "qu_conversion_factor_purchase_to_stock": 1.0,
                "qu_conversion_factor_price_to_stock": 1.0,
                "last_shopping_location_id": 1,
                "stock_amount": 4.0
            }),
        );
        details.insert(
            3,
            json!({
                "product": {"id": 3, "name": "Apple Juice", "location_id": 1},
                "last_price": 2.49,
                "default_quantity_unit_purchase": {"id": 2, "name": "Pack"},
                "qu_conversion_factor_purchase_to_stock": 6.0,
                "last_shopping_location_id": 1,
                "stock_amount": 2.0
            }),
        );
        details.insert(
            6,
            json!({
                "product": {"id": 6, "name": "Eggs", "location_id": 2},
                "last_price": 3.10,
                "default_quantity_unit_purchase": {"id": 2, "name": "Pack"},
                "qu_conversion_factor_purchase_to_stock": 10.0,
                "stock_amount": 12.0
            }),
        );
        // Product 5 (Butter) deliberately has no detail record: fetching it
        // fails and enrichment must degrade, not error.

        Self {
            products: Mutex::new(products),
            shopping_lists: Mutex::new(vec![json!({"id": 1, "name": "Groceries"})]),
            list_items: Mutex::new(vec![
                json!({"id": 10, "shopping_list_id": 1, "product_id": 1, "amount": 2.0}),
                json!({"id": 11, "shopping_list_id": 1, "product_id": 3, "amount": 1.0, "note": "for pancakes"}),
                json!({"id": 12, "shopping_list_id": 1, "product_id": null, "amount": 1.0, "note": "anything sweet"}),
                json!({"id": 13, "shopping_list_id": 2, "product_id": 1, "amount": 5.0}),
            ]),
            stock: Mutex::new(vec![
                json!({"product_id": 1, "amount": 4.0, "best_before_date": "2026-09-10"}),
                json!({"product_id": 5, "amount": 1.0}),
            ]),
            details: Mutex::new(details),
            locations: vec![
                json!({"id": 1, "name": "Pantry"}),
                json!({"id": 2, "name": "Fridge"}),
            ],
            quantity_units: vec![
                json!({"id": 1, "name": "Piece"}),
                json!({"id": 2, "name": "Pack"}),
                json!({"id": 3, "name": "Liter"}),
            ],
            product_groups: vec![json!({"id": 1, "name": "Dairy"})],
            stores: vec![json!({"id": 1, "name": "SuperMart"})],
            stock_adds: AtomicUsize::new(0),
            price_posts: AtomicUsize::new(0),
            product_creates: AtomicUsize::new(0),
            list_item_posts: AtomicUsize::new(0),
            product_fetches: AtomicUsize::new(0),
            next_product_id: AtomicUsize::new(100),
        }
    }
}

/// A running stub backend
pub struct StubBackend {
    pub addr: SocketAddr,
    pub state: Arc<StubState>,
}

impl StubBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

async fn get_products(State(s): State<Arc<StubState>>) -> Json<Value> {
    s.product_fetches.fetch_add(1, Ordering::SeqCst);
    Json(Value::Array(s.products.lock().unwrap().clone()))
}

async fn create_product(
    State(s): State<Arc<StubState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let id = s.next_product_id.fetch_add(1, Ordering::SeqCst) as i64;
    let mut product = body;
    product["id"] = json!(id);
    s.products.lock().unwrap().push(product);
    s.product_creates.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "created_object_id": id }))
}

async fn get_list_items(State(s): State<Arc<StubState>>) -> Json<Value> {
    Json(Value::Array(s.list_items.lock().unwrap().clone()))
}

async fn add_list_item(
    State(s): State<Arc<StubState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    s.list_items.lock().unwrap().push(body);
    s.list_item_posts.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "created_object_id": 999 }))
}

async fn get_details(
    State(s): State<Arc<StubState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match s.details.lock().unwrap().get(&id) {
        Some(d) => Json(d.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error_message": "no details"})))
            .into_response(),
    }
}

async fn add_stock(State(s): State<Arc<StubState>>, Path(_id): Path<i64>) -> Json<Value> {
    s.stock_adds.fetch_add(1, Ordering::SeqCst);
    Json(json!({}))
}

async fn record_price(State(s): State<Arc<StubState>>, Path(_id): Path<i64>) -> Json<Value> {
    s.price_posts.fetch_add(1, Ordering::SeqCst);
    Json(json!({}))
}

fn stub_router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/api/objects/products", get(get_products).post(create_product))
        .route(
            "/api/objects/shopping_lists",
            get(|State(s): State<Arc<StubState>>| async move {
                Json(Value::Array(s.shopping_lists.lock().unwrap().clone()))
            }),
        )
        .route(
            "/api/objects/shopping_list",
            get(get_list_items).post(add_list_item),
        )
        .route(
            "/api/objects/locations",
            get(|State(s): State<Arc<StubState>>| async move {
                Json(Value::Array(s.locations.clone()))
            }),
        )
        .route(
            "/api/objects/quantity_units",
            get(|State(s): State<Arc<StubState>>| async move {
                Json(Value::Array(s.quantity_units.clone()))
            }),
        )
        .route(
            "/api/objects/product_groups",
            get(|State(s): State<Arc<StubState>>| async move {
                Json(Value::Array(s.product_groups.clone()))
            }),
        )
        .route(
            "/api/objects/shopping_locations",
            get(|State(s): State<Arc<StubState>>| async move {
                Json(Value::Array(s.stores.clone()))
            }),
        )
        .route(
            "/api/stock",
            get(|State(s): State<Arc<StubState>>| async move {
                Json(Value::Array(s.stock.lock().unwrap().clone()))
            }),
        )
        .route("/api/stock/products/:id", get(get_details))
        .route("/api/stock/products/:id/add", post(add_stock))
        .route("/api/stock/products/:id/price", post(record_price))
        // Plain JSON route for pass-through tests
        .route(
            "/api/system/info",
            get(|| async { Json(json!({"version": "1.0"})) }),
        )
        // Expired-session imitations
        .route("/api/redirect", get(|| async { Redirect::to("/login") }))
        .route(
            "/api/htmlpage",
            get(|| async { Html("<html><body>Please log in</body></html>") }),
        )
        .with_state(state)
}

/// Spawn the stub backend on an ephemeral port
pub async fn spawn_stub() -> StubBackend {
    let state = Arc::new(StubState::with_fixture());
    let router = stub_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    StubBackend { addr, state }
}

/// Build a gateway router pointed at the stub, auth disabled
pub fn gateway(stub: &StubBackend) -> Router {
    gateway_with_token(stub, "")
}

/// Build a gateway router pointed at the stub with a required bearer token
pub fn gateway_with_token(stub: &StubBackend, token: &str) -> Router {
    let config = GatewayConfig {
        port: 0,
        backend_url: stub.base_url(),
        backend_api_key: "test-key".to_string(),
        gateway_token: token.to_string(),
        default_location: "Pantry".to_string(),
        default_quantity_unit: "Piece".to_string(),
        catalog_ttl_secs: 300,
        detail_ttl_secs: 60,
    };
    let backend =
        Arc::new(BackendClient::new(&config.backend_url, &config.backend_api_key).unwrap());
    let cache = Arc::new(MemoryCache::new());
    build_router(AppState::new(backend, cache, config))
}

/// Build a GET request
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a GET request with a bearer token
pub fn get_request_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a JSON POST request
pub fn post_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Read a response body as JSON
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}
