// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of live bidirectional connections.
//!
//! Connections are keyed by `(conversation_id, participant_id)` and hold a
//! bounded mpsc sender whose receiving side is drained by the transport
//! (the gateway's WebSocket forwarder task). Delivery uses `try_send` so a
//! slow or dead connection never blocks delivery to the others; delivery
//! to a single connection preserves submission order.
//!
//! The registry is an explicitly constructed, dependency-injected service:
//! tests instantiate isolated instances, and a future multi-process
//! deployment can swap in a shared pub/sub backend behind the same calls.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use deskline_core::events::ConversationEvent;
use deskline_core::types::ParticipantKind;

/// A single live connection's registry entry.
#[derive(Debug)]
struct ConnectionEntry {
    participant_kind: ParticipantKind,
    sender: mpsc::Sender<String>,
    last_activity: DateTime<Utc>,
}

/// Tracks live connections and fans events out to them.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<(String, String), ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Registers a connection, replacing any prior registration for the
    /// same `(conversation, participant)` key.
    pub fn attach(
        &self,
        conversation_id: &str,
        participant_id: &str,
        participant_kind: ParticipantKind,
        sender: mpsc::Sender<String>,
    ) {
        let key = (conversation_id.to_string(), participant_id.to_string());
        let replaced = self
            .connections
            .insert(
                key,
                ConnectionEntry {
                    participant_kind,
                    sender,
                    last_activity: Utc::now(),
                },
            )
            .is_some();
        debug!(
            conversation_id,
            participant_id,
            kind = %participant_kind,
            replaced,
            "connection attached"
        );
    }

    /// Removes a connection. Returns whether one was registered.
    pub fn detach(&self, conversation_id: &str, participant_id: &str) -> bool {
        let removed = self
            .connections
            .remove(&(conversation_id.to_string(), participant_id.to_string()))
            .is_some();
        debug!(conversation_id, participant_id, removed, "connection detached");
        removed
    }

    /// Records inbound activity for a connection.
    pub fn touch(&self, conversation_id: &str, participant_id: &str) {
        if let Some(mut entry) = self
            .connections
            .get_mut(&(conversation_id.to_string(), participant_id.to_string()))
        {
            entry.last_activity = Utc::now();
        }
    }

    /// Delivers an event to one connection, if open.
    ///
    /// Silently no-ops when the connection is absent or its handle is
    /// closed; a full outbound buffer drops the event with a warning
    /// rather than blocking. Returns whether the event was enqueued.
    pub fn send(
        &self,
        conversation_id: &str,
        participant_id: &str,
        event: &ConversationEvent,
    ) -> bool {
        let Ok(payload) = serde_json::to_string(event) else {
            warn!(conversation_id, "failed to serialize event");
            return false;
        };
        self.send_raw(conversation_id, participant_id, payload)
    }

    /// Delivers a pre-serialized payload to one connection, if open.
    pub fn send_raw(
        &self,
        conversation_id: &str,
        participant_id: &str,
        payload: String,
    ) -> bool {
        let key = (conversation_id.to_string(), participant_id.to_string());
        let Some(entry) = self.connections.get(&key) else {
            return false;
        };
        deliver(&entry.sender, payload, conversation_id, participant_id)
    }

    /// Delivers an event to every open connection of a conversation,
    /// optionally skipping one participant (typically the sender).
    ///
    /// Per-connection delivery failures are logged and never propagated;
    /// one broken connection must not block delivery to the others. No
    /// ordering guarantee is made across participants. Returns the number
    /// of connections the event was enqueued to.
    pub fn broadcast(
        &self,
        conversation_id: &str,
        event: &ConversationEvent,
        exclude_participant_id: Option<&str>,
    ) -> usize {
        let payload = match serde_json::to_string(event) {
            Ok(p) => p,
            Err(e) => {
                warn!(conversation_id, error = %e, "failed to serialize event");
                return 0;
            }
        };

        let mut delivered = 0;
        for entry in self.connections.iter() {
            let (entry_conversation, participant_id) = entry.key();
            if entry_conversation != conversation_id {
                continue;
            }
            if exclude_participant_id == Some(participant_id.as_str()) {
                continue;
            }
            if deliver(
                &entry.sender,
                payload.clone(),
                conversation_id,
                participant_id,
            ) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Participants currently attached to a conversation.
    pub fn participants(&self, conversation_id: &str) -> Vec<(String, ParticipantKind)> {
        self.connections
            .iter()
            .filter(|entry| entry.key().0 == conversation_id)
            .map(|entry| (entry.key().1.clone(), entry.participant_kind))
            .collect()
    }

    /// Number of live connections attached to a conversation.
    pub fn connection_count(&self, conversation_id: &str) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.key().0 == conversation_id)
            .count()
    }

    /// Total number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drops all registered connections.
    pub fn shutdown(&self) {
        let count = self.connections.len();
        self.connections.clear();
        debug!(count, "connection registry shut down");
    }
}

/// Enqueue a payload on one connection's bounded sender.
fn deliver(
    sender: &mpsc::Sender<String>,
    payload: String,
    conversation_id: &str,
    participant_id: &str,
) -> bool {
    if sender.is_closed() {
        debug!(conversation_id, participant_id, "skipping closed connection");
        return false;
    }
    match sender.try_send(payload) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(
                conversation_id,
                participant_id, "connection buffer full, dropping event"
            );
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(conversation_id, participant_id, "connection closed mid-send");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskline_core::types::ConversationStatus;

    fn status_event(conversation_id: &str) -> ConversationEvent {
        ConversationEvent::status_change(conversation_id, ConversationStatus::Active)
    }

    #[tokio::test]
    async fn attach_and_send_delivers_in_order() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        registry.attach("conv-1", "cust-1", ParticipantKind::Customer, tx);

        assert!(registry.send("conv-1", "cust-1", &status_event("conv-1")));
        assert!(registry.send(
            "conv-1",
            "cust-1",
            &ConversationEvent::status_change("conv-1", ConversationStatus::Resolved)
        ));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.contains("\"active\""));
        assert!(second.contains("\"resolved\""));
    }

    #[tokio::test]
    async fn send_to_absent_connection_is_a_noop() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send("conv-1", "nobody", &status_event("conv-1")));
    }

    #[tokio::test]
    async fn attach_replaces_prior_registration() {
        let registry = ConnectionRegistry::new();
        let (old_tx, mut old_rx) = mpsc::channel(8);
        let (new_tx, mut new_rx) = mpsc::channel(8);

        registry.attach("conv-1", "cust-1", ParticipantKind::Customer, old_tx);
        registry.attach("conv-1", "cust-1", ParticipantKind::Customer, new_tx);
        assert_eq!(registry.len(), 1);

        registry.send("conv-1", "cust-1", &status_event("conv-1"));
        assert!(new_rx.try_recv().is_ok());
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_skips_closed_connection_and_excluded_sender() {
        let registry = ConnectionRegistry::new();
        let (customer_tx, mut customer_rx) = mpsc::channel(8);
        let (agent_tx, mut agent_rx) = mpsc::channel(8);
        let (dead_tx, dead_rx) = mpsc::channel(8);

        registry.attach("conv-1", "cust-1", ParticipantKind::Customer, customer_tx);
        registry.attach("conv-1", "agent-1", ParticipantKind::Agent, agent_tx);
        registry.attach("conv-1", "ghost", ParticipantKind::Customer, dead_tx);
        drop(dead_rx); // closes the handle without detaching

        let delivered = registry.broadcast("conv-1", &status_event("conv-1"), None);
        assert_eq!(delivered, 2);
        assert!(customer_rx.try_recv().is_ok());
        assert!(agent_rx.try_recv().is_ok());

        let delivered = registry.broadcast("conv-1", &status_event("conv-1"), Some("cust-1"));
        assert_eq!(delivered, 1);
        assert!(customer_rx.try_recv().is_err());
        assert!(agent_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_is_scoped_to_the_conversation() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        registry.attach("conv-a", "cust-1", ParticipantKind::Customer, tx_a);
        registry.attach("conv-b", "cust-2", ParticipantKind::Customer, tx_b);

        let delivered = registry.broadcast("conv-a", &status_event("conv-a"), None);
        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_buffer_drops_instead_of_blocking() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        registry.attach("conv-1", "cust-1", ParticipantKind::Customer, tx);

        assert!(registry.send("conv-1", "cust-1", &status_event("conv-1")));
        // Buffer of one is now full; the next send drops without blocking.
        assert!(!registry.send("conv-1", "cust-1", &status_event("conv-1")));
    }

    #[tokio::test]
    async fn detach_and_shutdown() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::channel(8);
        registry.attach("conv-1", "cust-1", ParticipantKind::Customer, tx);
        assert_eq!(registry.connection_count("conv-1"), 1);

        let participants = registry.participants("conv-1");
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].1, ParticipantKind::Customer);

        assert!(registry.detach("conv-1", "cust-1"));
        assert!(!registry.detach("conv-1", "cust-1"));
        assert!(registry.is_empty());

        let (tx, _rx) = mpsc::channel(8);
        registry.attach("conv-1", "cust-1", ParticipantKind::Customer, tx);
        registry.shutdown();
        assert!(registry.is_empty());
    }
}
