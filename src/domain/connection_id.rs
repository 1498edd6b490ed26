//! Type-safe connection identifier.
//!
//! [`ConnectionId`] is assigned by the transport layer when a WebSocket
//! upgrade completes and lives exactly as long as that connection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque identity of one live relay connection.
///
/// Wraps a UUID v4 so that connection identities cannot be confused with
/// meeting identifiers or other strings. It is the primary key of
/// [`super::ConnectionRegistry`] and the routing address used by
/// [`super::SignalBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<uuid::Uuid>().map(Self)
    }
}
