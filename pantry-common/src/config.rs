//! Configuration loading and resolution
//!
//! Settings are resolved per-field with a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fully resolved gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port the gateway listens on
    pub port: u16,
    /// Base URL of the inventory backend (e.g. `http://localhost:9283`)
    pub backend_url: String,
    /// API key injected into every outbound backend request
    pub backend_api_key: String,
    /// Bearer token required on inbound requests; empty disables the check
    pub gateway_token: String,
    /// Location name used when product creation does not name one
    pub default_location: String,
    /// Quantity unit name used for unit roles left unset at creation
    pub default_quantity_unit: String,
    /// TTL for cached catalog collections (products, lists, units, ...)
    pub catalog_ttl_secs: u64,
    /// TTL for cached per-product detail records
    pub detail_ttl_secs: u64,
}

impl GatewayConfig {
    /// TTL for catalog collection cache entries
    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    /// TTL for per-product detail cache entries
    pub fn detail_ttl(&self) -> Duration {
        Duration::from_secs(self.detail_ttl_secs)
    }

    /// Reject configurations the gateway cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.backend_url.trim().is_empty() {
            return Err(Error::Config(
                "backend_url is required (set --backend-url, PANTRY_GW_BACKEND_URL, \
                 or backend_url in config.toml)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Optional settings from a TOML config file (lowest-priority tier)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub backend_url: Option<String>,
    pub backend_api_key: Option<String>,
    pub gateway_token: Option<String>,
    pub default_location: Option<String>,
    pub default_quantity_unit: Option<String>,
    pub catalog_ttl_secs: Option<u64>,
    pub detail_ttl_secs: Option<u64>,
}

/// Parse a TOML config document
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load the TOML config tier
///
/// An explicitly supplied path must exist and parse. Without an explicit
/// path the platform default locations are probed; absence is not an error
/// (the tier simply contributes nothing).
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        return parse_toml_config(&content);
    }

    for candidate in default_config_paths() {
        if candidate.exists() {
            let content = std::fs::read_to_string(&candidate)?;
            return parse_toml_config(&content);
        }
    }

    Ok(TomlConfig::default())
}

/// Default config file locations, probed in order
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("pantry-gw").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        paths.push(PathBuf::from("/etc/pantry-gw/config.toml"));
    }
    paths
}

/// Resolve one string setting across all four tiers
pub fn resolve_string(
    cli: Option<String>,
    env_var: &str,
    toml_value: Option<&String>,
    default: &str,
) -> String {
    if let Some(v) = cli {
        return v;
    }
    if let Ok(v) = std::env::var(env_var) {
        return v;
    }
    if let Some(v) = toml_value {
        return v.clone();
    }
    default.to_string()
}

/// Resolve one numeric setting across all four tiers
pub fn resolve_u64(cli: Option<u64>, env_var: &str, toml_value: Option<u64>, default: u64) -> u64 {
    if let Some(v) = cli {
        return v;
    }
    if let Ok(raw) = std::env::var(env_var) {
        if let Ok(v) = raw.parse::<u64>() {
            return v;
        }
        tracing::warn!("Ignoring non-numeric {}={:?}", env_var, raw);
    }
    if let Some(v) = toml_value {
        return v;
    }
    default
}
