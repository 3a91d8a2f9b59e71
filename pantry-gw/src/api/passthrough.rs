//! Raw pass-through for unenriched backend paths
//!
//! Anything under `/api/` that no enriched handler claims is forwarded
//! verbatim with injected backend credentials. A backend redirect or HTML
//! answer means the injected credentials were rejected upstream; that is
//! converted to a fixed gateway error and never forwarded to the caller.

use crate::api::error::ApiError;
use crate::backend::BackendError;
use crate::AppState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::Response;

pub async fn forward(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();
    if !path.starts_with("/api/") {
        return Err(ApiError::UnknownRoute(path));
    }

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
        .map_err(|_| ApiError::InvalidRequest("unsupported HTTP method".to_string()))?;

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let body = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("unreadable request body: {}", e)))?;

    tracing::debug!(%path_and_query, "forwarding to backend");
    let raw = state
        .backend
        .raw(method, &path_and_query, content_type.as_deref(), body.to_vec())
        .await?;

    if raw.looks_like_auth_failure() {
        return Err(ApiError::BackendAuthFailure);
    }

    let status = StatusCode::from_u16(raw.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);
    if let Some(ct) = raw.content_type {
        builder = builder.header(CONTENT_TYPE, ct);
    }
    builder
        .body(Body::from(raw.body))
        .map_err(|e| ApiError::Backend(BackendError::Parse(e.to_string())))
}
