//! Service layer: signaling logic orchestration.
//!
//! [`RelayService`] applies join, relay, chat, and disconnect transitions
//! to the [`super::domain::ConnectionRegistry`] and delivers the resulting
//! events through the [`super::domain::SignalBus`].

pub mod relay_service;

pub use relay_service::RelayService;
