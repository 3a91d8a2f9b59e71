//! Inbound bearer-token authentication
//!
//! The gateway sits behind a single static bearer token. An empty configured
//! token disables the check entirely (useful for local development and
//! integration tests).

use thiserror::Error;

/// Authentication failure reasons
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingHeader,

    #[error("Authorization header must use the Bearer scheme")]
    NotBearer,

    #[error("Bearer token does not match")]
    WrongToken,
}

/// Validate an inbound `Authorization` header against the configured token
///
/// An empty `expected` token disables authentication and always succeeds.
pub fn validate_bearer(header: Option<&str>, expected: &str) -> Result<(), AuthError> {
    if expected.is_empty() {
        return Ok(());
    }

    let header = header.ok_or(AuthError::MissingHeader)?;
    let token = header.strip_prefix("Bearer ").ok_or(AuthError::NotBearer)?;

    if token != expected {
        return Err(AuthError::WrongToken);
    }

    Ok(())
}
