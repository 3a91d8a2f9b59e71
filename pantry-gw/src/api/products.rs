//! Product endpoints: fuzzy search and guarded creation

use crate::api::error::ApiError;
use crate::api::map_json_rejection;
use crate::create::{self, CreateProductRequest, CreateProductResponse};
use crate::resolve::cached_products;
use crate::resolve::matcher::rank;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Upper bound on search results, also the default
pub const SEARCH_LIMIT_MAX: usize = 10;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchMatch {
    pub id: i64,
    pub name: String,
    pub score: u8,
    /// 0–1 confidence derived from the ordinal score
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub matches: Vec<SearchMatch>,
}

/// GET /enriched/products/search?q=...&limit=N
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::InvalidRequest("q is required".to_string()));
    }
    let limit = query
        .limit
        .unwrap_or(SEARCH_LIMIT_MAX)
        .clamp(1, SEARCH_LIMIT_MAX);

    let products = cached_products(&state).await?;
    let matches = rank(&query.q, &products, |p| p.name.as_str())
        .into_iter()
        .take(limit)
        .map(|s| SearchMatch {
            id: s.entity.id,
            name: s.entity.name.clone(),
            score: s.score,
            confidence: f64::from(s.score) / 100.0,
        })
        .collect();

    Ok(Json(SearchResponse {
        query: query.q,
        matches,
    }))
}

/// POST /enriched/products/create
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateProductResponse>), ApiError> {
    let Json(req) = body.map_err(map_json_rejection)?;
    let response = create::create_product(&state, req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
