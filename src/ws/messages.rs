//! WebSocket inbound message types.
//!
//! Clients send text frames shaped `{"event": "<name>", "data": {...}}`.
//! Outbound frames use the same envelope; see
//! [`crate::domain::RelayEvent`].

use serde::Deserialize;

use crate::domain::ConnectionId;
use crate::error::RelayError;

/// Events a client can send over the relay connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join a meeting under a display name.
    Join {
        /// Name shown to other participants.
        display_name: String,
        /// Meeting to join.
        meeting_id: String,
    },
    /// Forward an opaque negotiation payload to one peer.
    Negotiation {
        /// Destination connection.
        target_connection_id: ConnectionId,
        /// Offer, answer, or candidate; never inspected.
        payload: serde_json::Value,
    },
    /// Broadcast chat text to the sender's meeting.
    Chat {
        /// Message text.
        text: String,
    },
}

impl ClientEvent {
    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedEvent`] if the frame is not valid
    /// JSON, names an unknown event, or lacks required fields.
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Negotiation { .. } => "negotiation",
            Self::Chat { .. } => "chat",
        }
    }
}

/// Optional query on `GET /ws` that joins right after connecting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectParams {
    /// Display name handed over by the login flow.
    pub display_name: Option<String>,
    /// Meeting the client was invited to.
    pub meeting_id: Option<String>,
}

impl ConnectParams {
    /// Returns `(display_name, meeting_id)` when both are present.
    #[must_use]
    pub fn auto_join(&self) -> Option<(&str, &str)> {
        Some((self.display_name.as_deref()?, self.meeting_id.as_deref()?))
    }
}
