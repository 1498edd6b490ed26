//! Relay service: join, negotiation relay, chat broadcast, disconnect.

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRegistry, JoinOutcome, LeaveOutcome, MeetingId, Outbox, Participant,
    RelayEvent, SignalBus,
};
use crate::error::RelayError;

/// Orchestration layer for all signaling operations.
///
/// Owns references to the [`ConnectionRegistry`] for membership state and
/// the [`SignalBus`] for delivery. Join and disconnect take the bus routes,
/// then the registry write guard, and queue their notifications before the
/// guard is released; queuing never awaits a peer. Delivery is
/// fire-and-forget; a missing recipient is never an error.
#[derive(Debug, Clone)]
pub struct RelayService {
    registry: Arc<ConnectionRegistry>,
    bus: SignalBus,
    max_chat_bytes: usize,
}

impl RelayService {
    /// Creates a new `RelayService`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, bus: SignalBus, max_chat_bytes: usize) -> Self {
        Self {
            registry,
            bus,
            max_chat_bytes,
        }
    }

    /// Returns a reference to the inner [`ConnectionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Returns a reference to the inner [`SignalBus`].
    #[must_use]
    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    /// Opens the outbound queue of a fresh transport connection and queues
    /// the `connected` greeting. No participant is created.
    pub async fn connect(&self, connection_id: ConnectionId) -> Outbox {
        let outbox = self.bus.attach(connection_id).await;
        let _ = self
            .bus
            .send_to(connection_id, RelayEvent::Connected { connection_id })
            .await;
        tracing::debug!(%connection_id, "transport connected");
        outbox
    }

    /// Joins `connection_id` to `meeting_id`.
    ///
    /// Announces the newcomer to every member already in the room, then
    /// sends the newcomer the list of those members.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidField`] for a blank name or meeting id
    /// and [`RelayError::AlreadyJoined`] if the connection already joined.
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        display_name: &str,
        meeting_id: &str,
    ) -> Result<JoinOutcome, RelayError> {
        if display_name.trim().is_empty() {
            return Err(RelayError::InvalidField(
                "display_name must not be empty".to_string(),
            ));
        }
        if meeting_id.trim().is_empty() {
            return Err(RelayError::InvalidField(
                "meeting_id must not be empty".to_string(),
            ));
        }

        let participant = Participant::new(connection_id, display_name, MeetingId::new(meeting_id));
        // Routes before registry: the events below are queued under the
        // registry write guard, ordered against concurrent joins and leaves.
        let routes = self.bus.routes().await;
        let mut announced = 0;
        let outcome = self
            .registry
            .join_with(participant, |outcome| {
                announced = routes.fan_out(&connection_ids(&outcome.existing_peers), |_| {
                    RelayEvent::PeerAnnounced {
                        peer_display_name: display_name.to_string(),
                        peer_connection_id: connection_id,
                        total_count: outcome.total_count,
                    }
                });
                let _ = routes.send_to(
                    connection_id,
                    RelayEvent::ExistingPeers {
                        peers: outcome.existing_peers.clone(),
                    },
                );
            })
            .await?;
        drop(routes);

        tracing::info!(
            %connection_id,
            meeting_id,
            display_name,
            peers = outcome.existing_peers.len(),
            announced,
            total = outcome.total_count,
            "participant joined"
        );
        Ok(outcome)
    }

    /// Forwards an opaque negotiation payload from `source` to `target`.
    ///
    /// The target is not checked against the registry; an unknown target
    /// is a silent no-op. Returns whether the payload was queued.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotJoined`] if `source` has not joined.
    pub async fn relay_negotiation(
        &self,
        source: ConnectionId,
        target: ConnectionId,
        payload: serde_json::Value,
    ) -> Result<bool, RelayError> {
        if self.registry.find_by_connection(source).await.is_none() {
            return Err(RelayError::NotJoined(source));
        }

        let delivered = self
            .bus
            .send_to(
                target,
                RelayEvent::Negotiation {
                    payload,
                    source_connection_id: source,
                },
            )
            .await;
        tracing::debug!(%source, %target, delivered, "negotiation relayed");
        Ok(delivered)
    }

    /// Broadcasts `text` to every member of the sender's meeting,
    /// the sender included. Returns how many members it was queued for.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotJoined`] if `sender` has not joined and
    /// [`RelayError::InvalidField`] if `text` exceeds the size limit.
    pub async fn chat(&self, sender: ConnectionId, text: &str) -> Result<usize, RelayError> {
        let participant = self
            .registry
            .find_by_connection(sender)
            .await
            .ok_or(RelayError::NotJoined(sender))?;
        if text.len() > self.max_chat_bytes {
            return Err(RelayError::InvalidField(format!(
                "text exceeds {} bytes",
                self.max_chat_bytes
            )));
        }

        let members = self.registry.list_by_meeting(&participant.meeting_id).await;
        let delivered = self
            .bus
            .fan_out(&connection_ids(&members), |_| RelayEvent::Chat {
                sender_display_name: participant.display_name.clone(),
                text: text.to_string(),
            })
            .await;

        tracing::debug!(
            %sender,
            meeting_id = %participant.meeting_id,
            delivered,
            "chat broadcast"
        );
        Ok(delivered)
    }

    /// Tears down `connection_id`: detaches its queue, removes its
    /// participant, and tells the remaining room members.
    ///
    /// Returns `None` if the connection never joined; nothing is sent then.
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Option<LeaveOutcome> {
        self.bus.detach(connection_id).await;

        let routes = self.bus.routes().await;
        let mut notified = 0;
        let left = self
            .registry
            .leave_with(connection_id, |outcome| {
                notified = routes.fan_out(&connection_ids(&outcome.remaining_peers), |_| {
                    RelayEvent::PeerLeft {
                        closed_connection_id: connection_id,
                        remaining_count: outcome.total_count,
                    }
                });
            })
            .await;
        drop(routes);
        let Some(outcome) = left else {
            tracing::debug!(%connection_id, "transport closed before join");
            return None;
        };

        tracing::info!(
            %connection_id,
            meeting_id = %outcome.participant.meeting_id,
            notified,
            total = outcome.total_count,
            "participant left"
        );
        Some(outcome)
    }

    /// Sends `error` back to the connection that caused it.
    pub async fn reject(&self, connection_id: ConnectionId, error: &RelayError) {
        let _ = self
            .bus
            .send_to(connection_id, RelayEvent::Error(error.to_body()))
            .await;
    }
}

fn connection_ids(participants: &[Participant]) -> Vec<ConnectionId> {
    participants.iter().map(|p| p.connection_id).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn service() -> RelayService {
        RelayService::new(Arc::new(ConnectionRegistry::new()), SignalBus::new(), 64)
    }

    async fn next(outbox: &mut Outbox) -> RelayEvent {
        let Some(event) = outbox.recv().await else {
            panic!("outbox closed");
        };
        event
    }

    /// Connects and consumes the greeting.
    async fn open(svc: &RelayService) -> (ConnectionId, Outbox) {
        let id = ConnectionId::new();
        let mut outbox = svc.connect(id).await;
        let RelayEvent::Connected { connection_id } = next(&mut outbox).await else {
            panic!("first event must be connected");
        };
        assert_eq!(connection_id, id);
        (id, outbox)
    }

    #[tokio::test]
    async fn connect_alone_creates_no_participant() {
        let svc = service();
        let (id, _outbox) = open(&svc).await;
        assert!(svc.registry().find_by_connection(id).await.is_none());
        assert_eq!(svc.bus().connection_count().await, 1);
    }

    #[tokio::test]
    async fn first_joiner_gets_empty_peer_list() {
        let svc = service();
        let (a, mut rx_a) = open(&svc).await;

        assert!(svc.join(a, "alice", "room1").await.is_ok());
        let RelayEvent::ExistingPeers { peers } = next(&mut rx_a).await else {
            panic!("expected existing_peers");
        };
        assert!(peers.is_empty());
    }

    #[tokio::test]
    async fn second_joiner_is_announced_and_sees_first() {
        let svc = service();
        let (a, mut rx_a) = open(&svc).await;
        let (b, mut rx_b) = open(&svc).await;
        let _ = svc.join(a, "alice", "room1").await;
        let _ = next(&mut rx_a).await;

        assert!(svc.join(b, "bob", "room1").await.is_ok());

        let RelayEvent::PeerAnnounced {
            peer_display_name,
            peer_connection_id,
            total_count,
        } = next(&mut rx_a).await
        else {
            panic!("alice expected peer_announced");
        };
        assert_eq!(peer_display_name, "bob");
        assert_eq!(peer_connection_id, b);
        assert_eq!(total_count, 2);

        let RelayEvent::ExistingPeers { peers } = next(&mut rx_b).await else {
            panic!("bob expected existing_peers");
        };
        assert_eq!(peers.len(), 1);
        assert_eq!(peers.first().map(|p| p.connection_id), Some(a));
    }

    #[tokio::test]
    async fn duplicate_join_is_rejected() {
        let svc = service();
        let (a, _rx) = open(&svc).await;
        let _ = svc.join(a, "alice", "room1").await;

        let result = svc.join(a, "alice", "room2").await;
        assert!(matches!(result, Err(RelayError::AlreadyJoined(_))));
        assert_eq!(svc.registry().len().await, 1);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let svc = service();
        let (a, _rx) = open(&svc).await;
        assert!(matches!(
            svc.join(a, "  ", "room1").await,
            Err(RelayError::InvalidField(_))
        ));
        assert!(matches!(
            svc.join(a, "alice", "").await,
            Err(RelayError::InvalidField(_))
        ));
        assert!(svc.registry().is_empty().await);
    }

    #[tokio::test]
    async fn chat_reaches_room_including_sender() {
        let svc = service();
        let (a, mut rx_a) = open(&svc).await;
        let (b, mut rx_b) = open(&svc).await;
        let (c, mut rx_c) = open(&svc).await;
        let _ = svc.join(a, "alice", "room1").await;
        let _ = svc.join(b, "bob", "room1").await;
        let _ = svc.join(c, "carol", "room2").await;
        // Drain join traffic.
        let _ = next(&mut rx_a).await;
        let _ = next(&mut rx_a).await;
        let _ = next(&mut rx_b).await;
        let _ = next(&mut rx_c).await;

        assert_eq!(svc.chat(a, "hi").await.ok(), Some(2));
        for rx in [&mut rx_a, &mut rx_b] {
            let RelayEvent::Chat {
                sender_display_name,
                text,
            } = next(rx).await
            else {
                panic!("expected chat");
            };
            assert_eq!(sender_display_name, "alice");
            assert_eq!(text, "hi");
        }
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn chat_before_join_is_not_delivered() {
        let svc = service();
        let (a, _rx_a) = open(&svc).await;
        let (b, mut rx_b) = open(&svc).await;
        let _ = svc.join(b, "bob", "room1").await;
        let _ = next(&mut rx_b).await;

        assert!(matches!(
            svc.chat(a, "hello?").await,
            Err(RelayError::NotJoined(_))
        ));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn oversize_chat_is_rejected() {
        let svc = service();
        let (a, _rx) = open(&svc).await;
        let _ = svc.join(a, "alice", "room1").await;
        let long = "x".repeat(65);
        assert!(matches!(
            svc.chat(a, &long).await,
            Err(RelayError::InvalidField(_))
        ));
    }

    #[tokio::test]
    async fn negotiation_is_point_to_point() {
        let svc = service();
        let (a, mut rx_a) = open(&svc).await;
        let (b, mut rx_b) = open(&svc).await;
        let (c, mut rx_c) = open(&svc).await;
        for (id, name) in [(a, "a"), (b, "b"), (c, "c")] {
            let _ = svc.join(id, name, "room1").await;
        }
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}
        while rx_c.try_recv().is_ok() {}

        let payload = serde_json::json!({"sdp": "v=0"});
        assert_eq!(
            svc.relay_negotiation(a, b, payload.clone()).await.ok(),
            Some(true)
        );

        let RelayEvent::Negotiation {
            payload: got,
            source_connection_id,
        } = next(&mut rx_b).await
        else {
            panic!("b expected negotiation");
        };
        assert_eq!(got, payload);
        assert_eq!(source_connection_id, a);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn negotiation_to_unknown_target_is_silent() {
        let svc = service();
        let (a, mut rx_a) = open(&svc).await;
        let _ = svc.join(a, "alice", "room1").await;
        let _ = next(&mut rx_a).await;

        let result = svc
            .relay_negotiation(a, ConnectionId::new(), serde_json::json!({}))
            .await;
        assert_eq!(result.ok(), Some(false));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn negotiation_before_join_is_refused() {
        let svc = service();
        let (a, _rx_a) = open(&svc).await;
        let (b, mut rx_b) = open(&svc).await;

        let result = svc.relay_negotiation(a, b, serde_json::json!({})).await;
        assert!(matches!(result, Err(RelayError::NotJoined(_))));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_notifies_remaining_room_once() {
        let svc = service();
        let (a, mut rx_a) = open(&svc).await;
        let (b, _rx_b) = open(&svc).await;
        let (c, mut rx_c) = open(&svc).await;
        let _ = svc.join(a, "alice", "room1").await;
        let _ = svc.join(b, "bob", "room1").await;
        let _ = svc.join(c, "carol", "room2").await;
        while rx_a.try_recv().is_ok() {}
        while rx_c.try_recv().is_ok() {}

        let Some(outcome) = svc.disconnect(b).await else {
            panic!("bob had joined");
        };
        assert_eq!(outcome.total_count, 2);

        let RelayEvent::PeerLeft {
            closed_connection_id,
            remaining_count,
        } = next(&mut rx_a).await
        else {
            panic!("alice expected peer_left");
        };
        assert_eq!(closed_connection_id, b);
        assert_eq!(remaining_count, 2);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());

        let room = svc.registry().list_by_meeting(&MeetingId::from("room1")).await;
        assert_eq!(connection_ids(&room), vec![a]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_join_and_leave_keep_peer_order() {
        for _ in 0..500 {
            let svc = service();
            let (a, mut rx_a) = open(&svc).await;
            let (b, mut rx_b) = open(&svc).await;
            let _ = svc.join(a, "alice", "room1").await;
            let _ = next(&mut rx_a).await;

            let joiner = {
                let svc = svc.clone();
                tokio::spawn(async move { svc.join(b, "bob", "room1").await.is_ok() })
            };
            let leaver = {
                let svc = svc.clone();
                tokio::spawn(async move { svc.disconnect(a).await.is_some() })
            };
            let (joined, left) = tokio::join!(joiner, leaver);
            assert!(matches!(joined, Ok(true)));
            assert!(matches!(left, Ok(true)));

            let mut events = Vec::new();
            while let Ok(event) = rx_b.try_recv() {
                events.push(event);
            }
            let Some(RelayEvent::ExistingPeers { peers }) = events.first() else {
                panic!("bob's first event must be existing_peers, got {events:?}");
            };
            let saw_alice = peers.iter().any(|p| p.connection_id == a);
            let alice_left = events.iter().skip(1).any(|e| {
                matches!(e, RelayEvent::PeerLeft { closed_connection_id, .. } if *closed_connection_id == a)
            });
            assert_eq!(saw_alice, alice_left, "events: {events:?}");
        }
    }

    #[tokio::test]
    async fn disconnect_before_join_does_nothing() {
        let svc = service();
        let (a, _rx_a) = open(&svc).await;
        assert!(svc.disconnect(a).await.is_none());
        assert_eq!(svc.bus().connection_count().await, 0);
    }

    #[tokio::test]
    async fn reject_sends_error_to_offender_only() {
        let svc = service();
        let (a, mut rx_a) = open(&svc).await;
        svc.reject(a, &RelayError::UnsupportedFrame).await;

        let RelayEvent::Error(body) = next(&mut rx_a).await else {
            panic!("expected error event");
        };
        assert_eq!(body.code, 1003);
    }
}
