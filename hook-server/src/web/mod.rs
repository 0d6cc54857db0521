//! Web server module for receiving webhooks.
//!
//! A thin server with a single fallback handler:
//! - Validates method, shared secret, and payload shape
//! - Dispatches the derived event on the hub's five channels
//! - Acknowledges with a small JSON body and exact status code
//!
//! Listener registration happens on the `HookHub` shared with the server
//! state; the server holds no other mutable state between requests.

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::hub::HookHub;
use crate::Config;

pub use handlers::{webhook, Ack, AppState};

/// Build the router. The webhook handler is the fallback so every path
/// (and every method) reaches it.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(webhook)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until a shutdown signal arrives.
pub async fn serve(config: Config, hub: Arc<HookHub>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, hub);
    let app = router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(address = %addr, "webhook_server_listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("webhook_server_shutting_down");
}
