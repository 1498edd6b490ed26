//! Domain layer: participants, the connection registry, and event routing.
//!
//! This module holds the relay's shared state: the registry of joined
//! participants with its room index, the outbound event type, and the
//! signal bus that routes events to individual connections.

pub mod connection_id;
pub mod participant;
pub mod registry;
pub mod relay_event;
pub mod room_index;
pub mod signal_bus;

pub use connection_id::ConnectionId;
pub use participant::{MeetingId, Participant};
pub use registry::{ConnectionRegistry, JoinOutcome, LeaveOutcome};
pub use relay_event::RelayEvent;
pub use room_index::RoomIndex;
pub use signal_bus::{Outbox, Routes, SignalBus};
