//! Connection registry: the authoritative set of joined participants.
//!
//! [`ConnectionRegistry`] keeps a map from [`ConnectionId`] to
//! [`Participant`] and a [`RoomIndex`] for room-scoped lookups. Both live
//! behind a single [`tokio::sync::RwLock`], so every mutation updates the
//! map and the index in one critical section.
//!
//! The compound operations [`ConnectionRegistry::join`] and
//! [`ConnectionRegistry::leave`] take the room snapshot and perform the
//! mutation under the same write guard. Concurrent joins and leaves in a
//! room are therefore serialized, and the snapshot each caller receives is
//! exactly consistent with the notifications it goes on to send. The
//! `_with` variants queue those notifications inside the critical section;
//! queuing never awaits a peer.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::room_index::RoomIndex;
use super::{ConnectionId, MeetingId, Participant};
use crate::error::RelayError;

/// Result of an atomic join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Room members present before the new participant was inserted, in
    /// join order. Never contains the joiner.
    pub existing_peers: Vec<Participant>,
    /// Participant count across all meetings after the insert.
    pub total_count: usize,
}

/// Result of an atomic leave.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    /// The record that was removed.
    pub participant: Participant,
    /// Room members left behind, in join order.
    pub remaining_peers: Vec<Participant>,
    /// Participant count across all meetings after the removal.
    pub total_count: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    participants: HashMap<ConnectionId, Participant>,
    rooms: RoomIndex,
}

impl RegistryState {
    fn insert(&mut self, participant: Participant) -> Result<(), RelayError> {
        let connection_id = participant.connection_id;
        if self.participants.contains_key(&connection_id) {
            return Err(RelayError::AlreadyJoined(connection_id));
        }
        self.rooms.insert(&participant.meeting_id, connection_id);
        self.participants.insert(connection_id, participant);
        Ok(())
    }

    fn remove(&mut self, connection_id: ConnectionId) -> Option<Participant> {
        let participant = self.participants.remove(&connection_id)?;
        self.rooms.remove(&participant.meeting_id, connection_id);
        Some(participant)
    }

    fn room(&self, meeting_id: &MeetingId) -> Vec<Participant> {
        self.rooms
            .members(meeting_id)
            .iter()
            .filter_map(|id| self.participants.get(id).cloned())
            .collect()
    }
}

/// Shared registry of joined participants.
///
/// Created once at startup and injected into the relay service. A
/// transport connection that has not sent `join` has no record here.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a participant record.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::AlreadyJoined`] if a record for the same
    /// connection already exists.
    pub async fn add(&self, participant: Participant) -> Result<(), RelayError> {
        self.state.write().await.insert(participant)
    }

    /// Removes the record for `connection_id`, returning it. Absent ids
    /// are a no-op, since a disconnect may race with session teardown.
    pub async fn remove(&self, connection_id: ConnectionId) -> Option<Participant> {
        self.state.write().await.remove(connection_id)
    }

    /// Returns the participant for `connection_id`, if it has joined.
    pub async fn find_by_connection(&self, connection_id: ConnectionId) -> Option<Participant> {
        self.state
            .read()
            .await
            .participants
            .get(&connection_id)
            .cloned()
    }

    /// Returns the members of `meeting_id` in join order.
    pub async fn list_by_meeting(&self, meeting_id: &MeetingId) -> Vec<Participant> {
        self.state.read().await.room(meeting_id)
    }

    /// Snapshots the room and inserts `participant` as one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::AlreadyJoined`] if the connection already has
    /// a record; the registry is left unchanged.
    pub async fn join(&self, participant: Participant) -> Result<JoinOutcome, RelayError> {
        self.join_with(participant, |_| {}).await
    }

    /// Like [`Self::join`], but runs `deliver` on the outcome before the
    /// write guard is released.
    ///
    /// `deliver` must not await; it is where join notifications are queued
    /// so that no concurrent join or leave in the room can queue its own
    /// notifications in between.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::AlreadyJoined`] if the connection already has
    /// a record; `deliver` is not called then.
    pub async fn join_with<F>(
        &self,
        participant: Participant,
        deliver: F,
    ) -> Result<JoinOutcome, RelayError>
    where
        F: FnOnce(&JoinOutcome),
    {
        let mut state = self.state.write().await;
        let existing_peers = state.room(&participant.meeting_id);
        state.insert(participant)?;
        let outcome = JoinOutcome {
            existing_peers,
            total_count: state.participants.len(),
        };
        deliver(&outcome);
        Ok(outcome)
    }

    /// Removes the connection and snapshots the room it leaves behind as
    /// one atomic step. Returns `None` if the connection never joined.
    pub async fn leave(&self, connection_id: ConnectionId) -> Option<LeaveOutcome> {
        self.leave_with(connection_id, |_| {}).await
    }

    /// Like [`Self::leave`], but runs `deliver` on the outcome before the
    /// write guard is released. `deliver` must not await.
    pub async fn leave_with<F>(
        &self,
        connection_id: ConnectionId,
        deliver: F,
    ) -> Option<LeaveOutcome>
    where
        F: FnOnce(&LeaveOutcome),
    {
        let mut state = self.state.write().await;
        let participant = state.remove(connection_id)?;
        let remaining_peers = state.room(&participant.meeting_id);
        let outcome = LeaveOutcome {
            participant,
            remaining_peers,
            total_count: state.participants.len(),
        };
        deliver(&outcome);
        Some(outcome)
    }

    /// Returns the number of joined participants across all meetings.
    pub async fn len(&self) -> usize {
        self.state.read().await.participants.len()
    }

    /// Returns `true` if nobody has joined.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.participants.is_empty()
    }

    /// Returns the number of meetings with at least one participant.
    pub async fn meeting_count(&self) -> usize {
        self.state.read().await.rooms.room_count()
    }
}
