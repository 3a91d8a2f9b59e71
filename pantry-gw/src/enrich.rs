//! Multi-source enrichment assembler
//!
//! Builds composite views by joining a base collection with per-product
//! detail records fetched concurrently through the cache-aside store.
//! Enrichment is best-effort per field: a failed detail fetch nulls that
//! row's pricing, never the whole response. Output always preserves the
//! base collection's order, and truncation to the row caps is silent.

use crate::api::error::{ApiError, Candidate};
use crate::models::{ProductDetails, ShoppingList};
use crate::resolve::{
    cached_shopping_lists, cached_stores, product_detail_cache_key, resolve_exact, Resolution,
};
use crate::cache::get_or_fetch;
use crate::AppState;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tokio::task::JoinSet;

/// Shopping-list views carry at most this many lines
pub const LIST_ITEM_CAP: usize = 50;

/// Stock views carry at most this many rows
pub const STOCK_ROW_CAP: usize = 25;

/// Display name used when a product is missing from the detail map
const UNKNOWN_PRODUCT: &str = "Unknown";

/// Read-only projection of a product's last purchase
///
/// Informational only; never used to recompute stock quantities.
#[derive(Debug, Clone, Serialize)]
pub struct PricingContext {
    pub last_price: Option<f64>,
    pub price_unit: Option<String>,
    pub purchase_to_stock_factor: Option<f64>,
    pub price_to_stock_factor: Option<f64>,
}

impl PricingContext {
    fn empty() -> Self {
        Self {
            last_price: None,
            price_unit: None,
            purchase_to_stock_factor: None,
            price_to_stock_factor: None,
        }
    }

    fn from_details(details: &ProductDetails) -> Self {
        Self {
            last_price: details.last_price,
            price_unit: details
                .default_quantity_unit_purchase
                .as_ref()
                .map(|qu| qu.name.clone()),
            purchase_to_stock_factor: details.qu_conversion_factor_purchase_to_stock,
            price_to_stock_factor: details.qu_conversion_factor_price_to_stock,
        }
    }
}

/// One enriched shopping-list line
#[derive(Debug, Serialize)]
pub struct EnrichedListItem {
    pub id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub amount: f64,
    pub note: Option<String>,
    pub pricing: PricingContext,
    pub last_store: Option<String>,
}

/// Enriched shopping-list view
#[derive(Debug, Serialize)]
pub struct ShoppingListView {
    pub list_id: i64,
    pub list_name: String,
    pub items: Vec<EnrichedListItem>,
}

/// One enriched stock row
#[derive(Debug, Serialize)]
pub struct EnrichedStockRow {
    pub product_id: i64,
    pub product_name: String,
    pub amount: f64,
    pub best_before_date: Option<String>,
    pub pricing: PricingContext,
    pub last_store: Option<String>,
}

/// Enriched stock snapshot
#[derive(Debug, Serialize)]
pub struct StockView {
    pub rows: Vec<EnrichedStockRow>,
}

/// Resolve the target shopping list
///
/// An explicit id must exist. A list name must match exactly after
/// normalization; lists are administratively named, so fuzzy matching does
/// not apply. Without either, a sole list is used and several lists require
/// disambiguation.
pub async fn resolve_target_list(
    state: &AppState,
    list_id: Option<i64>,
    list_name: Option<&str>,
) -> Result<ShoppingList, ApiError> {
    let lists = cached_shopping_lists(state).await?;

    if let Some(id) = list_id {
        return lists
            .into_iter()
            .find(|l| l.id == id)
            .ok_or(ApiError::ListNotFound {
                query: id.to_string(),
            });
    }

    if let Some(name) = list_name {
        return match resolve_exact(name, &lists, |l| l.name.as_str()) {
            Resolution::Resolved(list) => Ok(list.clone()),
            Resolution::NotFound => Err(ApiError::ListNotFound {
                query: name.to_string(),
            }),
            Resolution::Ambiguous(candidates) => Err(ApiError::MultipleLists {
                candidates: candidates
                    .into_iter()
                    .map(|s| Candidate {
                        id: s.entity.id,
                        name: s.entity.name.clone(),
                        score: s.score,
                    })
                    .collect(),
            }),
        };
    }

    match lists.len() {
        0 => Err(ApiError::ListNotFound {
            query: "(default)".to_string(),
        }),
        1 => Ok(lists.into_iter().next().unwrap()),
        _ => Err(ApiError::MultipleLists {
            candidates: lists
                .into_iter()
                .map(|l| Candidate {
                    id: l.id,
                    name: l.name,
                    score: 100,
                })
                .collect(),
        }),
    }
}

/// Concurrently fetch detail records for a set of product IDs
///
/// One task per distinct ID, joined before assembly. Failures are logged
/// and leave the ID out of the map; callers degrade those rows.
pub async fn fetch_details_map(
    state: &AppState,
    ids: impl IntoIterator<Item = i64>,
) -> HashMap<i64, ProductDetails> {
    let distinct: HashSet<i64> = ids.into_iter().collect();

    let mut tasks = JoinSet::new();
    for id in distinct {
        let state = state.clone();
        tasks.spawn(async move {
            let backend = state.backend.clone();
            let result = get_or_fetch(
                state.cache.as_ref(),
                &product_detail_cache_key(id),
                state.config.detail_ttl(),
                || async move { backend.product_details(id).await },
            )
            .await;
            (id, result)
        });
    }

    let mut map = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, Ok(details))) => {
                map.insert(id, details);
            }
            Ok((id, Err(e))) => {
                tracing::warn!(product_id = id, error = %e, "detail fetch failed, row degrades");
            }
            Err(e) => {
                tracing::warn!(error = %e, "detail fetch task failed");
            }
        }
    }
    map
}

/// Store display names keyed by id; empty on failure (names degrade to null)
async fn store_names(state: &AppState) -> HashMap<i64, String> {
    match cached_stores(state).await {
        Ok(stores) => stores.into_iter().map(|s| (s.id, s.name)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "store fetch failed, store names degrade");
            HashMap::new()
        }
    }
}

fn enrichment_for(
    details: Option<&ProductDetails>,
    stores: &HashMap<i64, String>,
) -> (String, PricingContext, Option<String>) {
    match details {
        Some(d) => {
            let last_store = d
                .last_shopping_location_id
                .and_then(|id| stores.get(&id).cloned());
            (
                d.product.name.clone(),
                PricingContext::from_details(d),
                last_store,
            )
        }
        None => (UNKNOWN_PRODUCT.to_string(), PricingContext::empty(), None),
    }
}

/// Build the enriched shopping-list view
pub async fn shopping_list_view(
    state: &AppState,
    list_id: Option<i64>,
    list_name: Option<&str>,
) -> Result<ShoppingListView, ApiError> {
    let list = resolve_target_list(state, list_id, list_name).await?;

    let mut items = state.backend.shopping_list_items().await?;
    items.retain(|item| item.shopping_list_id == list.id);
    items.truncate(LIST_ITEM_CAP);

    let details = fetch_details_map(state, items.iter().filter_map(|i| i.product_id)).await;
    let stores = store_names(state).await;

    let enriched = items
        .into_iter()
        .map(|item| {
            let (product_name, pricing, last_store) = enrichment_for(
                item.product_id.and_then(|id| details.get(&id)),
                &stores,
            );
            EnrichedListItem {
                id: item.id,
                product_id: item.product_id,
                product_name,
                amount: item.amount,
                note: item.note,
                pricing,
                last_store,
            }
        })
        .collect();

    Ok(ShoppingListView {
        list_id: list.id,
        list_name: list.name,
        items: enriched,
    })
}

/// Build the enriched, capped stock snapshot
pub async fn stock_view(state: &AppState) -> Result<StockView, ApiError> {
    let mut entries = state.backend.stock().await?;
    entries.truncate(STOCK_ROW_CAP);

    let details = fetch_details_map(state, entries.iter().map(|e| e.product_id)).await;
    let stores = store_names(state).await;

    let rows = entries
        .into_iter()
        .map(|entry| {
            let (product_name, pricing, last_store) =
                enrichment_for(details.get(&entry.product_id), &stores);
            EnrichedStockRow {
                product_id: entry.product_id,
                product_name,
                amount: entry.amount,
                best_before_date: entry.best_before_date,
                pricing,
                last_store,
            }
        })
        .collect();

    Ok(StockView { rows })
}
