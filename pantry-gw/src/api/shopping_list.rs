//! Shopping-list endpoints

use crate::api::error::ApiError;
use crate::api::{map_json_rejection, require_product};
use crate::enrich::{self, ShoppingListView};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub list_id: Option<i64>,
    /// Destination list by name, exact after normalization
    #[serde(default)]
    pub list: Option<String>,
}

/// GET /enriched/shopping_list?list_id=N or ?list=name
pub async fn get_view(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ShoppingListView>, ApiError> {
    let view = enrich::shopping_list_view(&state, query.list_id, query.list.as_deref()).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_name: String,
    #[serde(default)]
    pub list_id: Option<i64>,
    /// Destination list by name, exact after normalization
    #[serde(default)]
    pub list: Option<String>,
    #[serde(default = "default_amount")]
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_amount() -> f64 {
    1.0
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    pub status: &'static str,
    pub list_id: i64,
    pub list: String,
    pub product_id: i64,
    pub product: String,
    pub amount: f64,
}

/// POST /enriched/shopping_list/add
///
/// Resolves the destination list and fuzzy-resolves the product before the
/// write; ambiguity or a miss on either is terminal.
pub async fn add_item(
    State(state): State<AppState>,
    body: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<AddItemResponse>, ApiError> {
    let Json(req) = body.map_err(map_json_rejection)?;

    let product_name = req.product_name.trim();
    if product_name.is_empty() {
        return Err(ApiError::InvalidRequest("product_name is required".to_string()));
    }
    if !req.amount.is_finite() || req.amount <= 0.0 {
        return Err(ApiError::InvalidRequest(format!(
            "amount must be a positive number, got {}",
            req.amount
        )));
    }

    let list = enrich::resolve_target_list(&state, req.list_id, req.list.as_deref()).await?;
    let product = require_product(&state, product_name).await?;

    state
        .backend
        .add_shopping_list_item(list.id, product.id, req.amount, req.note.as_deref())
        .await?;
    tracing::info!(list = %list.name, product = %product.name, amount = req.amount, "shopping list item added");

    Ok(Json(AddItemResponse {
        status: "added",
        list_id: list.id,
        list: list.name,
        product_id: product.id,
        product: product.name,
        amount: req.amount,
    }))
}
