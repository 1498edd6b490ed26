//! WebSocket layer: upgrade, per-connection sessions, wire messages.
//!
//! The endpoint at `/ws` carries all signaling traffic: joins, negotiation
//! relays, chat, and the notifications they trigger.

pub mod handler;
pub mod messages;
pub mod session;
