//! Per-connection outbound queues.
//!
//! [`SignalBus`] is the transport boundary of the relay. Every live
//! WebSocket attaches an unbounded [`tokio::sync::mpsc`] queue under its
//! [`ConnectionId`]; the session loop drains that queue into the socket.
//! Sending never awaits the peer, so a slow client cannot stall anyone
//! else. Delivery is at-most-once: a send to an id that is not attached is
//! silently dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, mpsc};

use super::{ConnectionId, RelayEvent};

/// Receiving half handed to a session when it attaches.
pub type Outbox = mpsc::UnboundedReceiver<RelayEvent>;

type OutboxMap = HashMap<ConnectionId, mpsc::UnboundedSender<RelayEvent>>;

/// Read-locked view of the routing table.
///
/// Queuing through a `Routes` never awaits, so it can run inside another
/// critical section. While it is alive no connection can attach or
/// detach.
#[derive(Debug)]
pub struct Routes<'a> {
    map: RwLockReadGuard<'a, OutboxMap>,
}

impl Routes<'_> {
    /// Queues `event` for `connection_id`. Unknown or closed destinations
    /// yield `false`.
    pub fn send_to(&self, connection_id: ConnectionId, event: RelayEvent) -> bool {
        match self.map.get(&connection_id) {
            Some(tx) => tx.send(event).is_ok(),
            None => {
                tracing::trace!(%connection_id, "dropping event for unknown connection");
                false
            }
        }
    }

    /// Queues a per-recipient event for each id in `recipients`. Returns
    /// how many events were queued.
    pub fn fan_out<F>(&self, recipients: &[ConnectionId], mut make_event: F) -> usize
    where
        F: FnMut(ConnectionId) -> RelayEvent,
    {
        recipients
            .iter()
            .filter_map(|id| self.map.get(id).map(|tx| (*id, tx)))
            .filter(|(id, tx)| tx.send(make_event(*id)).is_ok())
            .count()
    }
}

/// Routing table from connection id to outbound queue.
#[derive(Debug, Clone, Default)]
pub struct SignalBus {
    outboxes: Arc<RwLock<OutboxMap>>,
}

impl SignalBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a queue for `connection_id` and returns its receiver.
    ///
    /// Attaching the same id twice replaces the previous queue, which then
    /// yields `None` to its reader.
    pub async fn attach(&self, connection_id: ConnectionId) -> Outbox {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outboxes.write().await.insert(connection_id, tx);
        rx
    }

    /// Removes the queue for `connection_id`. Unknown ids are ignored.
    pub async fn detach(&self, connection_id: ConnectionId) {
        self.outboxes.write().await.remove(&connection_id);
    }

    /// Takes a read-locked view of the routing table.
    ///
    /// Callers that must queue events in the same critical section as a
    /// registry mutation take the routes first, then the registry lock.
    pub async fn routes(&self) -> Routes<'_> {
        Routes {
            map: self.outboxes.read().await,
        }
    }

    /// Queues `event` for `connection_id`.
    ///
    /// Returns `true` if the event was queued. An unknown or closed
    /// destination yields `false` and is not an error.
    pub async fn send_to(&self, connection_id: ConnectionId, event: RelayEvent) -> bool {
        self.routes().await.send_to(connection_id, event)
    }

    /// Queues a per-recipient event for each id in `recipients`.
    ///
    /// Returns how many events were queued.
    pub async fn fan_out<F>(&self, recipients: &[ConnectionId], make_event: F) -> usize
    where
        F: FnMut(ConnectionId) -> RelayEvent,
    {
        self.routes().await.fan_out(recipients, make_event)
    }

    /// Returns the number of attached connections.
    pub async fn connection_count(&self) -> usize {
        self.outboxes.read().await.len()
    }
}
