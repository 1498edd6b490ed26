//! meeting-relay server entry point.
//!
//! Starts the Axum HTTP server with the signaling WebSocket and REST
//! endpoints.

use meeting_relay::app_state::AppState;
use meeting_relay::config::{LogFormat, RelayConfig};
use meeting_relay::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RelayConfig::from_env().map_err(|e| anyhow::anyhow!("invalid config: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting meeting-relay");

    let listen_addr = config.listen_addr;
    let app_state = AppState::new(config);

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "server listening");

    server::serve(listener, app_state, server::shutdown_signal()).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
