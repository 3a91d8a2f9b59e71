//! Shared API response types

use serde::Serialize;
use serde_json::Value;

/// Structured error envelope returned by every failing gateway endpoint
///
/// `error` is a short machine-readable code (e.g. `product_not_found`,
/// `multiple_products`); `message` is for humans; `details` carries
/// contextual fields such as candidate lists for ambiguous resolutions.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    /// Create a new error body
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an error body with contextual details
    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_serializes_code_and_message() {
        let body = ErrorBody::new("product_not_found", "No product matches 'xyz'");
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("product_not_found"));
        assert!(json.contains("No product matches"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn error_body_with_details() {
        let details = serde_json::json!({ "candidates": ["Apple Juice", "Apple Sauce"] });
        let body = ErrorBody::with_details("multiple_products", "Ambiguous name", details);
        assert_eq!(body.error, "multiple_products");
        assert!(body.details.is_some());
    }
}
