//! Warden account lifecycle service.
//!
//! Main entry point for the Warden server. Loads configuration, wires the
//! store, gateway, and relay clients, and serves until shutdown.

use anyhow::{Context, Result};
use tracing::info;
use warden_api::{AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.rust_log)?;

    info!("Starting Warden account lifecycle service");

    let addr = config.parse_server_addr()?;
    info!(
        server_addr = %addr,
        request_timeout_seconds = config.request_timeout,
        stripe_configured = config.stripe_configured(),
        webhook_secret_configured = config.webhook_secret().is_some(),
        relay_configured = config.relay_url().is_some(),
        "Configuration loaded"
    );

    let state = AppState::from_config(&config)?;

    warden_api::start_server(state, addr, config.request_timeout())
        .await
        .context("HTTP server failed")?;

    info!("Warden shutdown complete");
    Ok(())
}

/// Initializes tracing, preferring `RUST_LOG` over the configured filter.
fn init_tracing(default_filter: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .or_else(|_| EnvFilter::try_new("info,warden=debug,tower_http=debug"))
        .context("Invalid log filter")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}
