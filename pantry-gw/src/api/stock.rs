//! Stock endpoints: enriched snapshot, single add, bulk add

use crate::api::error::ApiError;
use crate::api::map_json_rejection;
use crate::bulk::{self, BulkLine, BulkResponse};
use crate::enrich::{self, StockView};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

/// GET /enriched/stock
pub async fn get_view(State(state): State<AppState>) -> Result<Json<StockView>, ApiError> {
    let view = enrich::stock_view(&state).await?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub struct SingleAddResponse {
    pub status: &'static str,
    pub product: String,
    pub interpreted_as: String,
}

/// POST /enriched/stock/add
///
/// Single stock add; same pipeline as one bulk line, but failures surface
/// as a structured top-level error instead of a per-line record.
pub async fn add_single(
    State(state): State<AppState>,
    body: Result<Json<BulkLine>, JsonRejection>,
) -> Result<Json<SingleAddResponse>, ApiError> {
    let Json(line) = body.map_err(map_json_rejection)?;
    let outcome = bulk::process_line(&state, &line).await?;
    Ok(Json(SingleAddResponse {
        status: "added",
        product: outcome.product,
        interpreted_as: outcome.interpreted_as,
    }))
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub items: Vec<BulkLine>,
}

/// POST /enriched/stock/add/bulk
pub async fn add_bulk(
    State(state): State<AppState>,
    body: Result<Json<BulkRequest>, JsonRejection>,
) -> Result<Json<BulkResponse>, ApiError> {
    let Json(req) = body.map_err(map_json_rejection)?;
    Ok(Json(bulk::process_batch(&state, req.items).await))
}
