//! Gateway API errors
//!
//! Every failure leaving the gateway is one structured JSON object with a
//! short machine-readable `error` code plus contextual details — never a raw
//! backend body, an HTML page, or a redirect.

use crate::backend::BackendError;
use crate::models::Product;
use crate::resolve::matcher::Scored;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pantry_common::api::ErrorBody;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A resolution candidate echoed back on ambiguity errors
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub score: u8,
}

impl From<Scored<Product>> for Candidate {
    fn from(s: Scored<Product>) -> Self {
        Candidate {
            id: s.entity.id,
            name: s.entity.name,
            score: s.score,
        }
    }
}

/// Errors returned by gateway endpoints
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request body must be valid JSON: {0}")]
    InvalidJson(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No product matches {query:?}")]
    ProductNotFound { query: String },

    #[error("Product name {query:?} is ambiguous")]
    MultipleProducts {
        query: String,
        candidates: Vec<Candidate>,
    },

    #[error("Shopping list {query:?} not found")]
    ListNotFound { query: String },

    #[error("Several shopping lists match; specify list_id")]
    MultipleLists { candidates: Vec<Candidate> },

    #[error("Location {name:?} not found")]
    InvalidLocation { name: String },

    #[error("Quantity unit {name:?} for role {role:?} not found")]
    InvalidQuantityUnit { role: &'static str, name: String },

    #[error("Product group {name:?} not found")]
    InvalidProductGroup { name: String },

    #[error("Product {name:?} already exists")]
    ProductExists { name: String },

    #[error("No route for {0:?}")]
    UnknownRoute(String),

    #[error("Backend authentication failed")]
    BackendAuthFailure,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ApiError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::InvalidJson(_) => "invalid_json",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::ProductNotFound { .. } => "product_not_found",
            ApiError::MultipleProducts { .. } => "multiple_products",
            ApiError::ListNotFound { .. } => "list_not_found",
            ApiError::MultipleLists { .. } => "multiple_lists",
            ApiError::InvalidLocation { .. } => "invalid_location",
            ApiError::InvalidQuantityUnit { .. } => "invalid_quantity_unit",
            ApiError::InvalidProductGroup { .. } => "invalid_product_group",
            ApiError::ProductExists { .. } => "product_exists",
            ApiError::UnknownRoute(_) => "unknown_route",
            ApiError::BackendAuthFailure => "backend_auth_failed",
            ApiError::Backend(BackendError::Timeout) => "backend_timeout",
            ApiError::Backend(_) => "backend_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::InvalidJson(_)
            | ApiError::MultipleProducts { .. }
            | ApiError::MultipleLists { .. }
            | ApiError::InvalidLocation { .. }
            | ApiError::InvalidQuantityUnit { .. }
            | ApiError::InvalidProductGroup { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::ProductNotFound { .. }
            | ApiError::ListNotFound { .. }
            | ApiError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            ApiError::ProductExists { .. } => StatusCode::CONFLICT,
            ApiError::Backend(BackendError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::BackendAuthFailure | ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::ProductNotFound { query } => Some(json!({ "query": query })),
            ApiError::MultipleProducts { query, candidates } => {
                Some(json!({ "query": query, "candidates": candidates }))
            }
            ApiError::MultipleLists { candidates } => Some(json!({ "candidates": candidates })),
            ApiError::InvalidQuantityUnit { role, name } => {
                Some(json!({ "role": role, "name": name }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(code = self.code(), "request failed: {}", self);
        }

        let body = match self.details() {
            Some(details) => ErrorBody::with_details(self.code(), self.to_string(), details),
            None => ErrorBody::new(self.code(), self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
