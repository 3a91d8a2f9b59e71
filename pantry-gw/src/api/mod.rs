//! HTTP API handlers for the pantry gateway

pub mod auth_middleware;
pub mod error;
pub mod health;
pub mod passthrough;
pub mod products;
pub mod shopping_list;
pub mod stock;

use crate::models::Product;
use crate::resolve::{self, Resolution};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use error::ApiError;

/// Fuzzy-resolve a product name, turning the non-resolved arms into their
/// structured errors. Used by every handler that must not act on an
/// uncertain product.
pub async fn require_product(state: &AppState, query: &str) -> Result<Product, ApiError> {
    match resolve::resolve_product(state, query).await? {
        Resolution::Resolved(product) => Ok(product),
        Resolution::NotFound => Err(ApiError::ProductNotFound {
            query: query.to_string(),
        }),
        Resolution::Ambiguous(candidates) => Err(ApiError::MultipleProducts {
            query: query.to_string(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }),
    }
}

/// Map body-extraction failures to the structured input-error codes
pub(crate) fn map_json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(e) => ApiError::InvalidRequest(e.body_text()),
        other => ApiError::InvalidJson(other.body_text()),
    }
}
