//! # Pantry Gateway Common Library
//!
//! Shared code for the pantry gateway:
//! - Error types
//! - Configuration resolution (CLI → ENV → TOML → default)
//! - Inbound API authentication helpers
//! - Shared API response types

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
