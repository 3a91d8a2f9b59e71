//! Entity resolution against the backend catalog
//!
//! Product names are fuzzily resolved (they are free-typed by callers);
//! shopping lists, locations, quantity units, and product groups must match
//! exactly after normalization. A resolution is always exactly one of
//! resolved / not found / ambiguous, and ambiguity is terminal: nothing in
//! the gateway ever writes against an uncertain entity.

pub mod matcher;

use crate::backend::BackendError;
use crate::cache::{cache_key, get_or_fetch};
use crate::models::{Location, Product, ProductGroup, QuantityUnit, ShoppingList, Store};
use crate::AppState;
use matcher::{normalize, rank, Scored, SCORE_EXACT};

/// Candidates kept by the fuzzy resolver
pub const MAX_CANDIDATES: usize = 5;

/// Outcome of a resolution attempt; exactly one arm is ever populated
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    Resolved(T),
    NotFound,
    Ambiguous(Vec<Scored<T>>),
}

/// Decide a fuzzy resolution from a ranked candidate list
///
/// Keeps the top [`MAX_CANDIDATES`]. An exact match wins outright even when
/// other candidates scored — the sole bypass of ambiguity detection. Two or
/// more inexact candidates are ambiguous; a single one resolves.
pub fn decide<T>(mut ranked: Vec<Scored<T>>) -> Resolution<T> {
    ranked.truncate(MAX_CANDIDATES);

    if ranked.is_empty() {
        return Resolution::NotFound;
    }
    if ranked[0].score == SCORE_EXACT {
        return Resolution::Resolved(ranked.swap_remove(0).entity);
    }
    if ranked.len() >= 2 {
        return Resolution::Ambiguous(ranked);
    }
    Resolution::Resolved(ranked.swap_remove(0).entity)
}

/// Exact-after-normalization resolution for administratively exact entities
pub fn resolve_exact<'a, T, F>(query: &str, candidates: &'a [T], name: F) -> Resolution<&'a T>
where
    F: Fn(&T) -> &str,
{
    let query_norm = normalize(query);
    if query_norm.is_empty() {
        return Resolution::NotFound;
    }

    let matches: Vec<&T> = candidates
        .iter()
        .filter(|c| normalize(name(c)) == query_norm)
        .collect();

    match matches.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Resolved(matches[0]),
        _ => Resolution::Ambiguous(
            matches
                .into_iter()
                .map(|entity| Scored {
                    entity,
                    score: SCORE_EXACT,
                })
                .collect(),
        ),
    }
}

// ---- cached catalog sets ----------------------------------------------

const NS: &str = "backend";

pub async fn cached_products(state: &AppState) -> Result<Vec<Product>, BackendError> {
    let backend = state.backend.clone();
    get_or_fetch(
        state.cache.as_ref(),
        &cache_key(NS, "products"),
        state.config.catalog_ttl(),
        || async move { backend.products().await },
    )
    .await
}

pub async fn cached_shopping_lists(state: &AppState) -> Result<Vec<ShoppingList>, BackendError> {
    let backend = state.backend.clone();
    get_or_fetch(
        state.cache.as_ref(),
        &cache_key(NS, "shopping-lists"),
        state.config.catalog_ttl(),
        || async move { backend.shopping_lists().await },
    )
    .await
}

pub async fn cached_locations(state: &AppState) -> Result<Vec<Location>, BackendError> {
    let backend = state.backend.clone();
    get_or_fetch(
        state.cache.as_ref(),
        &cache_key(NS, "locations"),
        state.config.catalog_ttl(),
        || async move { backend.locations().await },
    )
    .await
}

pub async fn cached_quantity_units(state: &AppState) -> Result<Vec<QuantityUnit>, BackendError> {
    let backend = state.backend.clone();
    get_or_fetch(
        state.cache.as_ref(),
        &cache_key(NS, "quantity-units"),
        state.config.catalog_ttl(),
        || async move { backend.quantity_units().await },
    )
    .await
}

pub async fn cached_product_groups(state: &AppState) -> Result<Vec<ProductGroup>, BackendError> {
    let backend = state.backend.clone();
    get_or_fetch(
        state.cache.as_ref(),
        &cache_key(NS, "product-groups"),
        state.config.catalog_ttl(),
        || async move { backend.product_groups().await },
    )
    .await
}

pub async fn cached_stores(state: &AppState) -> Result<Vec<Store>, BackendError> {
    let backend = state.backend.clone();
    get_or_fetch(
        state.cache.as_ref(),
        &cache_key(NS, "stores"),
        state.config.catalog_ttl(),
        || async move { backend.stores().await },
    )
    .await
}

/// Cache key of the product collection, for invalidation after creation
pub fn products_cache_key() -> String {
    cache_key(NS, "products")
}

/// Cache key of a per-product detail record
pub fn product_detail_cache_key(product_id: i64) -> String {
    cache_key(NS, &format!("stock-product/{}", product_id))
}

// ---- resolvers ---------------------------------------------------------

/// Fuzzy-resolve a free-text product name against the cached catalog
pub async fn resolve_product(
    state: &AppState,
    name: &str,
) -> Result<Resolution<Product>, BackendError> {
    let products = cached_products(state).await?;
    let ranked = rank(name, &products, |p| p.name.as_str())
        .into_iter()
        .map(|s| Scored {
            entity: s.entity.clone(),
            score: s.score,
        })
        .collect();
    Ok(decide(ranked))
}
