//! Backend entity types
//!
//! Every entity is owned and mutated by the inventory backend; the gateway
//! only reads them and keys them by their backend-assigned numeric ID.

use serde::{Deserialize, Serialize};

/// A product in the backend catalog
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub qu_id_stock: Option<i64>,
    #[serde(default)]
    pub qu_id_purchase: Option<i64>,
    #[serde(default)]
    pub product_group_id: Option<i64>,
}

/// A shopping list (the list itself, not its items)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShoppingList {
    pub id: i64,
    pub name: String,
}

/// One line of a shopping list
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShoppingListItem {
    pub id: i64,
    pub shopping_list_id: i64,
    #[serde(default)]
    pub product_id: Option<i64>,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
}

/// A storage location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
}

/// A quantity unit (piece, pack, gram, ...)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuantityUnit {
    pub id: i64,
    pub name: String,
}

/// A product group
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductGroup {
    pub id: i64,
    pub name: String,
}

/// A store products can be purchased from
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
}

/// One row of the current stock snapshot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StockEntry {
    pub product_id: i64,
    pub amount: f64,
    #[serde(default)]
    pub best_before_date: Option<String>,
}

/// Per-product detail record from the backend stock endpoint
///
/// Carries the last-purchase context used for pricing enrichment. All
/// pricing fields are optional: a product that has never been purchased
/// has none of them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductDetails {
    pub product: Product,
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub default_quantity_unit_purchase: Option<QuantityUnit>,
    #[serde(default)]
    pub qu_conversion_factor_purchase_to_stock: Option<f64>,
    #[serde(default)]
    pub qu_conversion_factor_price_to_stock: Option<f64>,
    #[serde(default)]
    pub last_shopping_location_id: Option<i64>,
    #[serde(default)]
    pub stock_amount: Option<f64>,
}

/// Body for creating a product on the backend
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub location_id: i64,
    pub qu_id_stock: i64,
    pub qu_id_purchase: i64,
    pub qu_id_consume: i64,
    pub qu_id_price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_group_id: Option<i64>,
}
