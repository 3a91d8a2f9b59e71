//! pantry-gw — enrichment gateway for a private inventory backend

use anyhow::{Context, Result};
use clap::Parser;
use pantry_common::config::{self, GatewayConfig};
use pantry_gw::backend::BackendClient;
use pantry_gw::cache::MemoryCache;
use pantry_gw::{build_router, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pantry-gw")]
#[command(about = "Enrichment gateway for the pantry inventory backend")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Base URL of the inventory backend
    #[arg(long)]
    backend_url: Option<String>,

    /// API key injected into outbound backend requests
    #[arg(long)]
    backend_api_key: Option<String>,

    /// Bearer token required on inbound requests (empty disables the check)
    #[arg(long)]
    gateway_token: Option<String>,

    /// Location name used when product creation does not name one
    #[arg(long)]
    default_location: Option<String>,

    /// Quantity unit name used for unit roles left unset at creation
    #[arg(long)]
    default_quantity_unit: Option<String>,

    /// TTL in seconds for cached catalog collections
    #[arg(long)]
    catalog_ttl: Option<u64>,

    /// TTL in seconds for cached per-product details
    #[arg(long)]
    detail_ttl: Option<u64>,

    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Resolve every setting across CLI, environment, TOML file, and defaults
fn resolve_config(args: Args) -> pantry_common::Result<GatewayConfig> {
    let toml = config::load_toml_config(args.config.as_deref())?;

    let cfg = GatewayConfig {
        port: config::resolve_u64(
            args.port.map(u64::from),
            "PANTRY_GW_PORT",
            toml.port.map(u64::from),
            9187,
        ) as u16,
        backend_url: config::resolve_string(
            args.backend_url,
            "PANTRY_GW_BACKEND_URL",
            toml.backend_url.as_ref(),
            "",
        ),
        backend_api_key: config::resolve_string(
            args.backend_api_key,
            "PANTRY_GW_BACKEND_API_KEY",
            toml.backend_api_key.as_ref(),
            "",
        ),
        gateway_token: config::resolve_string(
            args.gateway_token,
            "PANTRY_GW_TOKEN",
            toml.gateway_token.as_ref(),
            "",
        ),
        default_location: config::resolve_string(
            args.default_location,
            "PANTRY_GW_DEFAULT_LOCATION",
            toml.default_location.as_ref(),
            "Pantry",
        ),
        default_quantity_unit: config::resolve_string(
            args.default_quantity_unit,
            "PANTRY_GW_DEFAULT_QU",
            toml.default_quantity_unit.as_ref(),
            "Piece",
        ),
        catalog_ttl_secs: config::resolve_u64(
            args.catalog_ttl,
            "PANTRY_GW_CATALOG_TTL",
            toml.catalog_ttl_secs,
            300,
        ),
        detail_ttl_secs: config::resolve_u64(
            args.detail_ttl,
            "PANTRY_GW_DETAIL_TTL",
            toml.detail_ttl_secs,
            60,
        ),
    };

    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pantry_gw=debug,tower=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let cfg = resolve_config(args).context("Failed to resolve configuration")?;

    info!(
        "Starting pantry-gw v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        cfg.port
    );
    info!("Backend: {}", cfg.backend_url);
    if cfg.gateway_token.is_empty() {
        info!("Inbound authentication disabled (no gateway token configured)");
    }

    let backend = Arc::new(
        BackendClient::new(&cfg.backend_url, &cfg.backend_api_key)
            .context("Failed to build backend client")?,
    );
    let cache = Arc::new(MemoryCache::new());

    let port = cfg.port;
    let state = AppState::new(backend, cache, cfg);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
