//! # meeting-relay
//!
//! Real-time signaling relay for peer-to-peer audio, video, and
//! screen-share meetings.
//!
//! Clients open a WebSocket, join a meeting under a display name, and the
//! relay forwards session-negotiation payloads (offers, answers,
//! candidates) and chat text between members. Media never passes through
//! the relay. Membership lives in a single in-memory registry; delivery is
//! best-effort and at-most-once.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Session (ws/)        REST Handlers (api/)
//!     │
//!     ├── RelayService (service/)
//!     │
//!     ├── ConnectionRegistry + RoomIndex (domain/)
//!     └── SignalBus → per-connection outboxes (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod ws;
