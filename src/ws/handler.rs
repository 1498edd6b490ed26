//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;

use super::messages::ConnectParams;
use super::session::run_session;
use crate::app_state::AppState;
use crate::domain::ConnectionId;

/// `GET /ws` — Upgrade HTTP connection to a relay WebSocket.
///
/// A fresh [`ConnectionId`] is assigned once the upgrade completes. When
/// both `display_name` and `meeting_id` are present in the query, the
/// session joins that meeting right after the `connected` greeting.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let relay_service = std::sync::Arc::clone(&state.relay_service);

    ws.max_message_size(state.config.max_frame_bytes)
        .on_upgrade(move |socket| async move {
            let connection_id = ConnectionId::new();
            let outbox = relay_service.connect(connection_id).await;
            run_session(socket, connection_id, outbox, params, relay_service).await;
        })
}
