//! Inbound authentication middleware
//!
//! Static bearer-token check against the configured gateway token. An empty
//! configured token disables the check entirely.

use crate::api::error::ApiError;
use crate::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use pantry_common::api::validate_bearer;

pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match validate_bearer(header, &state.config.gateway_token) {
        Ok(()) => next.run(request).await,
        Err(e) => ApiError::Unauthorized(e.to_string()).into_response(),
    }
}
