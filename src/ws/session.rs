//! WebSocket session state machine.
//!
//! Each connection runs one [`Session`] through
//! `Connected → Joined → Closed`. The read/write loop decodes inbound
//! frames into [`ClientEvent`]s and drains the connection's outbox into the
//! socket. Disconnect runs exactly once, whatever ends the loop.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::Instrument;

use super::messages::{ClientEvent, ConnectParams};
use crate::domain::{ConnectionId, MeetingId, Outbox, RelayEvent};
use crate::error::RelayError;
use crate::service::RelayService;

/// Lifecycle of one relay connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Transport open, no participant record yet.
    Connected,
    /// Participant record present in the registry.
    Joined {
        /// Meeting the connection joined.
        meeting_id: MeetingId,
    },
    /// Terminal: record removed, no further events processed.
    Closed,
}

/// Per-connection handler state.
#[derive(Debug)]
pub struct Session {
    connection_id: ConnectionId,
    state: SessionState,
    service: Arc<RelayService>,
}

impl Session {
    /// Creates a session in the `Connected` state.
    #[must_use]
    pub fn new(connection_id: ConnectionId, service: Arc<RelayService>) -> Self {
        Self {
            connection_id,
            state: SessionState::Connected,
            service,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handles one inbound text frame.
    ///
    /// Malformed frames and rejected requests produce an `error` event for
    /// this connection only. Chat and negotiation before `join` are
    /// dropped without a reply.
    pub async fn handle_text(&mut self, text: &str) {
        match ClientEvent::parse(text) {
            Ok(event) => self.handle_event(event).await,
            Err(err) => {
                tracing::warn!(error = %err, "rejecting malformed frame");
                self.service.reject(self.connection_id, &err).await;
            }
        }
    }

    /// Applies a decoded client event to the state machine.
    pub async fn handle_event(&mut self, event: ClientEvent) {
        let name = event.name();
        let result = match event {
            ClientEvent::Join {
                display_name,
                meeting_id,
            } => self.join(&display_name, &meeting_id).await,
            ClientEvent::Negotiation {
                target_connection_id,
                payload,
            } => self
                .service
                .relay_negotiation(self.connection_id, target_connection_id, payload)
                .await
                .map(|_| ()),
            ClientEvent::Chat { text } => self
                .service
                .chat(self.connection_id, &text)
                .await
                .map(|_| ()),
        };

        match result {
            Ok(()) => {}
            Err(RelayError::NotJoined(_)) => {
                tracing::debug!(event = name, "dropping event sent before join");
            }
            Err(err) => {
                tracing::warn!(event = name, error = %err, "event rejected");
                self.service.reject(self.connection_id, &err).await;
            }
        }
    }

    /// Handles a frame type that carries no signaling meaning.
    pub async fn handle_binary(&self) {
        tracing::warn!("rejecting binary frame");
        self.service
            .reject(self.connection_id, &RelayError::UnsupportedFrame)
            .await;
    }

    async fn join(&mut self, display_name: &str, meeting_id: &str) -> Result<(), RelayError> {
        match self.state {
            SessionState::Connected => {}
            SessionState::Joined { .. } => return Err(RelayError::AlreadyJoined(self.connection_id)),
            SessionState::Closed => return Ok(()),
        }
        let outcome = self
            .service
            .join(self.connection_id, display_name, meeting_id)
            .await?;
        tracing::trace!(peers = outcome.existing_peers.len(), "session joined");
        self.state = SessionState::Joined {
            meeting_id: MeetingId::new(meeting_id),
        };
        Ok(())
    }

    /// Runs the disconnect transition. Later calls are no-ops.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        let _ = self.service.disconnect(self.connection_id).await;
    }
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads client frames and feeds them to the [`Session`].
/// - Forwards events queued in the connection's [`Outbox`] to the client.
pub async fn run_session(
    socket: WebSocket,
    connection_id: ConnectionId,
    outbox: Outbox,
    params: ConnectParams,
    service: Arc<RelayService>,
) {
    let span = tracing::info_span!("session", %connection_id);
    drive(socket, connection_id, outbox, params, service)
        .instrument(span)
        .await;
}

async fn drive(
    socket: WebSocket,
    connection_id: ConnectionId,
    mut outbox: Outbox,
    params: ConnectParams,
    service: Arc<RelayService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut session = Session::new(connection_id, service);

    if let Some((display_name, meeting_id)) = params.auto_join() {
        session
            .handle_event(ClientEvent::Join {
                display_name: display_name.to_string(),
                meeting_id: meeting_id.to_string(),
            })
            .await;
    }

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => session.handle_text(&text).await,
                    Some(Ok(Message::Binary(_))) => session.handle_binary().await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Event queued for this connection
            event = outbox.recv() => {
                let Some(event) = event else { break };
                let json = match encode(&event) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::error!(event = event.name(), error = %err, "failed to encode event");
                        continue;
                    }
                };
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    session.close().await;
    tracing::debug!("ws connection closed");
}

/// Encodes an event the way the write loop puts it on the wire.
///
/// # Errors
///
/// Returns [`RelayError::Internal`] if serialization fails.
pub fn encode(event: &RelayEvent) -> Result<String, RelayError> {
    serde_json::to_string(event).map_err(|e| RelayError::Internal(e.to_string()))
}
