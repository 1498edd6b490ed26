//! Participant record and meeting identifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ConnectionId;

/// Caller-supplied room key. Participants sharing a `MeetingId` can reach
/// each other; no room object exists beyond this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct MeetingId(String);

impl MeetingId {
    /// Wraps a meeting identifier string as given by the client.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MeetingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One joined connection.
///
/// Immutable for the lifetime of the connection: a client that wants a
/// different name or room must reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Participant {
    /// Transport-assigned identity of the connection.
    pub connection_id: ConnectionId,
    /// Human-readable name; opaque, not unique.
    pub display_name: String,
    /// Room the participant joined.
    pub meeting_id: MeetingId,
}

impl Participant {
    /// Builds a participant record.
    #[must_use]
    pub fn new(
        connection_id: ConnectionId,
        display_name: impl Into<String>,
        meeting_id: MeetingId,
    ) -> Self {
        Self {
            connection_id,
            display_name: display_name.into(),
            meeting_id,
        }
    }
}
