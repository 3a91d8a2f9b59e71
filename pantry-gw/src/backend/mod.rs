//! Inventory backend REST client
//!
//! The backend is an opaque object store reached only through its documented
//! endpoints. Credentials are injected as an `X-Api-Key` header on every
//! request. There is no retry anywhere: failures surface to the caller.

use crate::models::{
    Location, NewProduct, Product, ProductDetails, ProductGroup, QuantityUnit, ShoppingList,
    ShoppingListItem, StockEntry, Store,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Header carrying the backend API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Timeout applied to every outbound backend call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Size ceiling for downloaded product images
pub const IMAGE_MAX_BYTES: usize = 2 * 1024 * 1024;

/// Backend client errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend request timed out")]
    Timeout,

    #[error("Backend error {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Image rejected: {0}")]
    Image(String),
}

impl BackendError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

/// Response of a raw pass-through call
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Heuristic for an upstream auth failure: the backend answered with a
    /// login redirect or an HTML page instead of API JSON.
    pub fn looks_like_auth_failure(&self) -> bool {
        if (300..400).contains(&self.status) {
            return true;
        }
        self.content_type
            .as_deref()
            .map(|ct| ct.starts_with("text/html"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    created_object_id: i64,
}

/// REST client for the inventory backend
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BackendClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            // Redirects stay observable: a 3xx from the backend is an auth
            // failure signal, never something to follow.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self
            .http
            .get(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Status(status.as_u16(), text));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, BackendError> {
        let response = self
            .http
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Status(status.as_u16(), text));
        }

        Ok(response)
    }

    // ---- catalog collections -------------------------------------------

    pub async fn products(&self) -> Result<Vec<Product>, BackendError> {
        self.get_json("/api/objects/products").await
    }

    pub async fn shopping_lists(&self) -> Result<Vec<ShoppingList>, BackendError> {
        self.get_json("/api/objects/shopping_lists").await
    }

    pub async fn shopping_list_items(&self) -> Result<Vec<ShoppingListItem>, BackendError> {
        self.get_json("/api/objects/shopping_list").await
    }

    pub async fn locations(&self) -> Result<Vec<Location>, BackendError> {
        self.get_json("/api/objects/locations").await
    }

    pub async fn quantity_units(&self) -> Result<Vec<QuantityUnit>, BackendError> {
        self.get_json("/api/objects/quantity_units").await
    }

    pub async fn product_groups(&self) -> Result<Vec<ProductGroup>, BackendError> {
        self.get_json("/api/objects/product_groups").await
    }

    pub async fn stores(&self) -> Result<Vec<Store>, BackendError> {
        self.get_json("/api/objects/shopping_locations").await
    }

    // ---- stock ---------------------------------------------------------

    pub async fn stock(&self) -> Result<Vec<StockEntry>, BackendError> {
        self.get_json("/api/stock").await
    }

    pub async fn product_details(&self, product_id: i64) -> Result<ProductDetails, BackendError> {
        self.get_json(&format!("/api/stock/products/{}", product_id))
            .await
    }

    pub async fn add_stock(
        &self,
        product_id: i64,
        amount: f64,
        best_before_date: Option<&str>,
    ) -> Result<(), BackendError> {
        let body = serde_json::json!({
            "amount": amount,
            "best_before_date": best_before_date,
        });
        self.post_json(&format!("/api/stock/products/{}/add", product_id), &body)
            .await?;
        Ok(())
    }

    pub async fn record_price(&self, product_id: i64, price: f64) -> Result<(), BackendError> {
        let body = serde_json::json!({ "price": price });
        self.post_json(&format!("/api/stock/products/{}/price", product_id), &body)
            .await?;
        Ok(())
    }

    // ---- shopping list -------------------------------------------------

    pub async fn add_shopping_list_item(
        &self,
        shopping_list_id: i64,
        product_id: i64,
        amount: f64,
        note: Option<&str>,
    ) -> Result<(), BackendError> {
        let body = serde_json::json!({
            "shopping_list_id": shopping_list_id,
            "product_id": product_id,
            "amount": amount,
            "note": note,
        });
        self.post_json("/api/objects/shopping_list", &body).await?;
        Ok(())
    }

    // ---- product creation ----------------------------------------------

    pub async fn create_product(&self, product: &NewProduct) -> Result<i64, BackendError> {
        let response = self.post_json("/api/objects/products", product).await?;
        let created: CreatedObject = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        Ok(created.created_object_id)
    }

    /// Download a product image from an arbitrary URL, enforcing the size
    /// ceiling and an `image/*` content-type check.
    pub async fn fetch_image(&self, url: &str) -> Result<(Vec<u8>, String), BackendError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16(), String::new()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(BackendError::Image(format!(
                "unexpected content type {:?}",
                content_type
            )));
        }

        if let Some(len) = response.content_length() {
            if len as usize > IMAGE_MAX_BYTES {
                return Err(BackendError::Image(format!("{} bytes exceeds ceiling", len)));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(BackendError::from_reqwest)?;
        if bytes.len() > IMAGE_MAX_BYTES {
            return Err(BackendError::Image(format!(
                "{} bytes exceeds ceiling",
                bytes.len()
            )));
        }

        Ok((bytes.to_vec(), content_type))
    }

    pub async fn upload_product_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .put(self.url(&format!("/api/files/product_pictures/{}", file_name)))
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Status(status.as_u16(), text));
        }
        Ok(())
    }

    // ---- pass-through --------------------------------------------------

    /// Forward an arbitrary request verbatim, injecting backend credentials.
    /// The caller decides what to do with redirects and HTML answers.
    pub async fn raw(
        &self,
        method: reqwest::Method,
        path_and_query: &str,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> Result<RawResponse, BackendError> {
        let mut request = self
            .http
            .request(method, self.url(path_and_query))
            .header(API_KEY_HEADER, &self.api_key);
        if let Some(ct) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, ct);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await.map_err(BackendError::from_reqwest)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response
            .bytes()
            .await
            .map_err(BackendError::from_reqwest)?
            .to_vec();

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = BackendClient::new("http://localhost:9283/", "key");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().url("/api/stock"), "http://localhost:9283/api/stock");
    }

    #[test]
    fn redirect_is_auth_failure() {
        let raw = RawResponse {
            status: 302,
            content_type: None,
            body: Vec::new(),
        };
        assert!(raw.looks_like_auth_failure());
    }

    #[test]
    fn html_body_is_auth_failure() {
        let raw = RawResponse {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: b"<html>login</html>".to_vec(),
        };
        assert!(raw.looks_like_auth_failure());
    }

    #[test]
    fn json_success_is_not_auth_failure() {
        let raw = RawResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: b"{}".to_vec(),
        };
        assert!(!raw.looks_like_auth_failure());
    }
}
