//! Outbound events the relay delivers to connections.
//!
//! Each variant serializes as `{"event": "<name>", "data": {...}}`, the
//! same envelope clients use for inbound events.

use serde::Serialize;

use super::{ConnectionId, Participant};
use crate::error::ErrorBody;

/// Event queued for delivery to one connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RelayEvent {
    /// First event on every connection: tells the client its own identity.
    Connected {
        /// Identity assigned to this connection.
        connection_id: ConnectionId,
    },

    /// A new participant joined the recipient's meeting.
    PeerAnnounced {
        /// Display name of the newcomer.
        peer_display_name: String,
        /// Connection of the newcomer.
        peer_connection_id: ConnectionId,
        /// Participants across all meetings after the join.
        total_count: usize,
    },

    /// Sent to a joiner: the members already in the meeting.
    ExistingPeers {
        /// Members in join order, excluding the joiner.
        peers: Vec<Participant>,
    },

    /// Opaque negotiation payload forwarded from another connection.
    Negotiation {
        /// Payload exactly as the source sent it.
        payload: serde_json::Value,
        /// Connection that sent the payload.
        source_connection_id: ConnectionId,
    },

    /// Chat text broadcast to the meeting.
    Chat {
        /// Display name of the sender.
        sender_display_name: String,
        /// Message text.
        text: String,
    },

    /// A member of the recipient's meeting disconnected.
    PeerLeft {
        /// Connection that closed.
        closed_connection_id: ConnectionId,
        /// Participants across all meetings after the removal.
        remaining_count: usize,
    },

    /// The recipient's last inbound event was rejected.
    Error(ErrorBody),
}

impl RelayEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::PeerAnnounced { .. } => "peer_announced",
            Self::ExistingPeers { .. } => "existing_peers",
            Self::Negotiation { .. } => "negotiation",
            Self::Chat { .. } => "chat",
            Self::PeerLeft { .. } => "peer_left",
            Self::Error(_) => "error",
        }
    }
}
