//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::domain::{ConnectionRegistry, SignalBus};
use crate::service::RelayService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay service for all signaling logic.
    pub relay_service: Arc<RelayService>,
    /// Configuration the server was started with.
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Builds a fresh registry, signal bus, and service for `config`.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let relay_service = Arc::new(RelayService::new(
            registry,
            SignalBus::new(),
            config.max_chat_bytes,
        ));
        Self {
            relay_service,
            config: Arc::new(config),
        }
    }
}
