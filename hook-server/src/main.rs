//! GitHook server binary.
//!
//! Receives source-control webhooks over HTTP and dispatches them on the
//! in-process hub. Configuration comes from the environment; see
//! `config.rs` for the variables and defaults.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use githook::{Config, HookHub};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("webhook_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        host = %config.host,
        port = config.port,
        secret_configured = config.secret_required(),
        "config_loaded"
    );

    // The hub is owned here and shared with the server state; embedders
    // register listeners on it before serving.
    let hub = Arc::new(HookHub::new());

    githook::web::serve(config, hub).await?;

    info!("webhook_server_shutdown_complete");

    Ok(())
}
