//! Common error types for the pantry gateway

use thiserror::Error;

/// Common result type for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared between the gateway binary and its library code
///
/// Request-level failures live in the gateway's own API error type; this
/// only covers what shared code can fail at (startup and configuration).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
