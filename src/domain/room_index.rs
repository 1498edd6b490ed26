//! Room partition view maintained incrementally alongside the registry.
//!
//! [`RoomIndex`] maps each meeting to the connections currently in it, in
//! join order. It is mutated in the same critical section as the
//! participant map, so a removal is visible to the very next lookup.
//! Empty rooms are dropped from the index immediately.

use std::collections::HashMap;

use super::{ConnectionId, MeetingId};

/// Secondary index: meeting → member connection ids in join order.
#[derive(Debug, Default)]
pub struct RoomIndex {
    rooms: HashMap<MeetingId, Vec<ConnectionId>>,
}

impl RoomIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `connection_id` to the member list of `meeting_id`.
    pub fn insert(&mut self, meeting_id: &MeetingId, connection_id: ConnectionId) {
        self.rooms
            .entry(meeting_id.clone())
            .or_default()
            .push(connection_id);
    }

    /// Removes `connection_id` from `meeting_id`. Returns `false` if it was
    /// not a member.
    pub fn remove(&mut self, meeting_id: &MeetingId, connection_id: ConnectionId) -> bool {
        let Some(members) = self.rooms.get_mut(meeting_id) else {
            return false;
        };
        let before = members.len();
        members.retain(|id| *id != connection_id);
        let removed = members.len() != before;
        if members.is_empty() {
            self.rooms.remove(meeting_id);
        }
        removed
    }

    /// Member ids of `meeting_id` in join order; empty for unknown rooms.
    #[must_use]
    pub fn members(&self, meeting_id: &MeetingId) -> &[ConnectionId] {
        self.rooms
            .get(meeting_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of non-empty rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
