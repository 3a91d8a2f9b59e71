//! Partial-success bulk stock processor
//!
//! Each retained line is processed independently: validation, fuzzy product
//! resolution, detail fetch, stock-add write, and an optional detached
//! price-recording write whose failure never affects the line. One line's
//! failure never stops, skips, or rolls back another line.

use crate::api::error::ApiError;
use crate::api::require_product;
use crate::cache::get_or_fetch;
use crate::resolve::product_detail_cache_key;
use crate::AppState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lines beyond this position are dropped before processing; the drop is
/// visible only through the summary's `total`.
pub const BULK_LINE_CAP: usize = 25;

/// One inbound bulk line
#[derive(Debug, Clone, Deserialize)]
pub struct BulkLine {
    /// Caller-supplied line reference, echoed back verbatim
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub best_before_date: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Per-line outcome record, independent of all sibling lines
#[derive(Debug, Serialize)]
pub struct BulkLineResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreted_as: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Aggregate counts over the retained lines
#[derive(Debug, Serialize)]
pub struct BulkSummary {
    pub total: usize,
    pub added: usize,
    pub errors: usize,
}

/// Bulk response: one result per retained line, in input order
#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub results: Vec<BulkLineResult>,
    pub summary: BulkSummary,
}

/// Successful line outcome
#[derive(Debug)]
pub struct LineAdded {
    pub product: String,
    pub interpreted_as: String,
}

/// Shape validation for one line; no backend call is made before this passes
fn validate(line: &BulkLine) -> Result<(String, f64, Option<String>), ApiError> {
    let name = line
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("name is required".to_string()))?;

    let amount = line
        .amount
        .ok_or_else(|| ApiError::InvalidRequest("amount is required".to_string()))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::InvalidRequest(format!(
            "amount must be a positive number, got {}",
            amount
        )));
    }

    if let Some(date) = line.best_before_date.as_deref() {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            ApiError::InvalidRequest(format!(
                "best_before_date must be YYYY-MM-DD, got {:?}",
                date
            ))
        })?;
    }

    Ok((
        name.to_string(),
        amount,
        line.best_before_date.clone(),
    ))
}

/// Process one line end to end
pub async fn process_line(state: &AppState, line: &BulkLine) -> Result<LineAdded, ApiError> {
    let (name, amount, best_before) = validate(line)?;

    let product = require_product(state, &name).await?;

    let backend = state.backend.clone();
    let product_id = product.id;
    let details = get_or_fetch(
        state.cache.as_ref(),
        &product_detail_cache_key(product_id),
        state.config.detail_ttl(),
        || async move { backend.product_details(product_id).await },
    )
    .await?;

    state
        .backend
        .add_stock(product.id, amount, best_before.as_deref())
        .await?;

    if let Some(price) = line.price {
        // Fire and forget: outcome intentionally discarded, only logged
        let backend = state.backend.clone();
        let product_name = details.product.name.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.record_price(product_id, price).await {
                tracing::warn!(product = %product_name, error = %e, "price recording failed");
            }
        });
    }

    Ok(LineAdded {
        product: details.product.name.clone(),
        interpreted_as: format!("{} x {}", amount, details.product.name),
    })
}

/// Process a batch with per-line isolation and aggregate reporting
pub async fn process_batch(state: &AppState, mut lines: Vec<BulkLine>) -> BulkResponse {
    lines.truncate(BULK_LINE_CAP);

    let mut results = Vec::with_capacity(lines.len());
    let mut added = 0usize;
    let mut errors = 0usize;

    for line in &lines {
        match process_line(state, line).await {
            Ok(outcome) => {
                added += 1;
                results.push(BulkLineResult {
                    line: line.line.clone(),
                    status: "added",
                    product: Some(outcome.product),
                    interpreted_as: Some(outcome.interpreted_as),
                    error: None,
                    reason: None,
                });
            }
            Err(e) => {
                errors += 1;
                results.push(BulkLineResult {
                    line: line.line.clone(),
                    status: "error",
                    product: None,
                    interpreted_as: None,
                    error: Some(e.code().to_string()),
                    reason: Some(e.to_string()),
                });
            }
        }
    }

    BulkResponse {
        summary: BulkSummary {
            total: results.len(),
            added,
            errors,
        },
        results,
    }
}
