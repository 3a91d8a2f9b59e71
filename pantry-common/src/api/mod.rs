//! Shared API types and inbound authentication helpers

pub mod auth;
pub mod types;

pub use auth::{validate_bearer, AuthError};
pub use types::ErrorBody;
