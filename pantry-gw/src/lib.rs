//! pantry-gw library — stateless enrichment gateway
//!
//! Sits in front of a private inventory-management backend: resolves
//! loosely-specified entities against the backend catalog, assembles
//! enriched views, and applies hard safety limits so pathological input
//! never reaches or overwhelms the backend.

use axum::Router;
use chrono::{DateTime, Utc};
use pantry_common::config::GatewayConfig;
use std::sync::Arc;

pub mod api;
pub mod backend;
pub mod bulk;
pub mod cache;
pub mod create;
pub mod enrich;
pub mod models;
pub mod resolve;

use backend::BackendClient;
use cache::CacheStore;

/// Application state shared across HTTP handlers
///
/// The cache is the only state that outlives a request; everything else is
/// per-request and isolated.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub cache: Arc<dyn CacheStore>,
    pub config: Arc<GatewayConfig>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        backend: Arc<BackendClient>,
        cache: Arc<dyn CacheStore>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            backend,
            cache,
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}

/// Build the application router
///
/// Everything except `/health` sits behind the bearer-token check. Paths no
/// enriched handler claims fall through to the backend pass-through.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let protected = Router::new()
        .route("/enriched/shopping_list", get(api::shopping_list::get_view))
        .route(
            "/enriched/shopping_list/add",
            post(api::shopping_list::add_item),
        )
        .route("/enriched/stock", get(api::stock::get_view))
        .route("/enriched/stock/add", post(api::stock::add_single))
        .route("/enriched/stock/add/bulk", post(api::stock::add_bulk))
        .route("/enriched/products/search", get(api::products::search))
        .route("/enriched/products/create", post(api::products::create))
        .fallback(api::passthrough::forward)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware::require_bearer,
        ));

    let public = Router::new().route("/health", get(api::health::health_check));

    Router::new().merge(protected).merge(public).with_state(state)
}
