//! Product-creation orchestrator
//!
//! A strict ordered pipeline that fails closed at each gate: no partial
//! object ever reaches the backend before every mandatory field resolved.
//! Only the image step is best-effort, and it runs after the product
//! already exists.

use crate::api::error::ApiError;
use crate::backend::BackendError;
use crate::models::NewProduct;
use crate::resolve::matcher::normalize;
use crate::resolve::{
    cached_locations, cached_product_groups, cached_products, cached_quantity_units,
    products_cache_key, resolve_exact, Resolution,
};
use crate::AppState;
use serde::{Deserialize, Serialize};

/// Inbound product-creation request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    /// Destination location name; falls back to the configured default
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub qu_stock: Option<String>,
    #[serde(default)]
    pub qu_purchase: Option<String>,
    #[serde(default)]
    pub qu_consume: Option<String>,
    #[serde(default)]
    pub qu_price: Option<String>,
    #[serde(default)]
    pub product_group: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Creation confirmation
#[derive(Debug, Serialize)]
pub struct CreateProductResponse {
    pub id: i64,
    pub name: String,
    pub location: String,
    /// Outcome of the best-effort image step, when one was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'static str>,
}

/// Run the creation pipeline
pub async fn create_product(
    state: &AppState,
    req: CreateProductRequest,
) -> Result<CreateProductResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidRequest("name is required".to_string()));
    }

    // Gate 1: dedupe on normalized name
    let existing = cached_products(state).await?;
    let name_norm = normalize(name);
    if let Some(dup) = existing.iter().find(|p| normalize(&p.name) == name_norm) {
        return Err(ApiError::ProductExists {
            name: dup.name.clone(),
        });
    }

    // Gate 2: destination location, exact after normalization
    let location_name = req
        .location
        .as_deref()
        .unwrap_or(&state.config.default_location);
    let locations = cached_locations(state).await?;
    let location = match resolve_exact(location_name, &locations, |l| l.name.as_str()) {
        Resolution::Resolved(l) => l.clone(),
        _ => {
            return Err(ApiError::InvalidLocation {
                name: location_name.to_string(),
            })
        }
    };

    // Gate 3: all four quantity-unit roles, each independently defaultable
    let units = cached_quantity_units(state).await?;
    let roles: [(&'static str, Option<&str>); 4] = [
        ("stock", req.qu_stock.as_deref()),
        ("purchase", req.qu_purchase.as_deref()),
        ("consume", req.qu_consume.as_deref()),
        ("price", req.qu_price.as_deref()),
    ];
    let mut unit_ids = [0i64; 4];
    for (slot, (role, supplied)) in roles.iter().enumerate() {
        let unit_name = supplied.unwrap_or(&state.config.default_quantity_unit);
        match resolve_exact(unit_name, &units, |u| u.name.as_str()) {
            Resolution::Resolved(u) => unit_ids[slot] = u.id,
            _ => {
                return Err(ApiError::InvalidQuantityUnit {
                    role,
                    name: unit_name.to_string(),
                })
            }
        }
    }

    // Gate 4: optional product group, only validated when supplied
    let mut product_group_id = None;
    if let Some(group_name) = req.product_group.as_deref() {
        let groups = cached_product_groups(state).await?;
        match resolve_exact(group_name, &groups, |g| g.name.as_str()) {
            Resolution::Resolved(g) => product_group_id = Some(g.id),
            _ => {
                return Err(ApiError::InvalidProductGroup {
                    name: group_name.to_string(),
                })
            }
        }
    }

    // All gates passed: the one and only creation write
    let id = state
        .backend
        .create_product(&NewProduct {
            name: name.to_string(),
            location_id: location.id,
            qu_id_stock: unit_ids[0],
            qu_id_purchase: unit_ids[1],
            qu_id_consume: unit_ids[2],
            qu_id_price: unit_ids[3],
            product_group_id,
        })
        .await?;
    tracing::info!(product = name, id, "product created");

    // Best-effort image step; the product already exists, so failure is
    // recorded but never fails the creation
    let mut image = None;
    if let Some(url) = req.image_url.as_deref() {
        image = Some(match attach_image(state, id, url).await {
            Ok(()) => "uploaded",
            Err(e) => {
                tracing::warn!(id, error = %e, "image upload failed");
                "failed"
            }
        });
    }

    // Subsequent resolutions must see the new product immediately
    state.cache.delete(&products_cache_key()).await;

    Ok(CreateProductResponse {
        id,
        name: name.to_string(),
        location: location.name,
        image,
    })
}

async fn attach_image(state: &AppState, product_id: i64, url: &str) -> Result<(), BackendError> {
    let (bytes, content_type) = state.backend.fetch_image(url).await?;
    let ext = content_type
        .strip_prefix("image/")
        .map(|e| e.split(';').next().unwrap_or(e).trim())
        .filter(|e| !e.is_empty())
        .unwrap_or("bin");
    let file_name = format!("product-{}.{}", product_id, ext);
    state
        .backend
        .upload_product_image(&file_name, bytes, &content_type)
        .await
}
