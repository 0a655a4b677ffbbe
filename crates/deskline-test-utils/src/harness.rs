// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Isolated engine harness for integration tests.
//!
//! Each harness wires a fresh in-memory store, registry, typing
//! coordinator, broadcaster with capturing notifier, routing engine, and
//! both lifecycle managers. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use deskline_conversation::ConversationManager;
use deskline_core::error::DesklineError;
use deskline_core::traits::StorageAdapter;
use deskline_core::types::{Agent, ParticipantKind};
use deskline_realtime::{
    ConnectionRegistry, DEFAULT_TYPING_EXPIRY, EventBroadcaster, TypingCoordinator,
};
use deskline_routing::{AgentDirectory, RoutingEngine};
use deskline_storage::MemoryStorage;
use deskline_ticket::{SlaPolicy, TicketManager};

use crate::mock_notifier::MockNotifier;

/// A fully wired engine over in-memory collaborators.
pub struct TestHarness {
    pub storage: Arc<MemoryStorage>,
    pub registry: Arc<ConnectionRegistry>,
    pub typing: Arc<TypingCoordinator>,
    pub notifier: Arc<MockNotifier>,
    pub conversations: Arc<ConversationManager>,
    pub tickets: Arc<TicketManager>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Build a harness with all defaults.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Seed an agent into storage.
    pub async fn seed_agent(&self, agent: Agent) -> Result<(), DesklineError> {
        self.storage.create_agent(&agent).await
    }

    /// Attach a capturing connection to a conversation.
    ///
    /// Returns the receiving side; every event broadcast to the
    /// conversation (except those excluding this participant) shows up as
    /// a JSON string.
    pub fn observe(
        &self,
        conversation_id: &str,
        participant_id: &str,
        kind: ParticipantKind,
    ) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(64);
        self.registry.attach(conversation_id, participant_id, kind, tx);
        rx
    }

    /// Drain everything currently buffered on an observer.
    pub fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<serde_json::Value> {
        let mut events = Vec::new();
        while let Ok(payload) = rx.try_recv() {
            if let Ok(value) = serde_json::from_str(&payload) {
                events.push(value);
            }
        }
        events
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    strict_transitions: bool,
    sla: SlaPolicy,
    typing_expiry: Duration,
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self {
            strict_transitions: false,
            sla: SlaPolicy::default(),
            typing_expiry: DEFAULT_TYPING_EXPIRY,
        }
    }
}

impl TestHarnessBuilder {
    /// Enforce the explicit transition tables.
    pub fn strict_transitions(mut self) -> Self {
        self.strict_transitions = true;
        self
    }

    /// Override the SLA policy.
    pub fn with_sla(mut self, sla: SlaPolicy) -> Self {
        self.sla = sla;
        self
    }

    /// Override the typing expiry window.
    pub fn with_typing_expiry(mut self, expiry: Duration) -> Self {
        self.typing_expiry = expiry;
        self
    }

    pub fn build(self) -> TestHarness {
        let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let typing = Arc::new(TypingCoordinator::new(
            Arc::clone(&registry),
            self.typing_expiry,
        ));
        let notifier = Arc::new(MockNotifier::new());
        let broadcaster = Arc::new(EventBroadcaster::new(
            Arc::clone(&registry),
            Some(notifier.clone() as Arc<dyn deskline_core::traits::Notifier>),
        ));
        let routing = Arc::new(RoutingEngine::new(storage.clone()));
        let directory = Arc::new(AgentDirectory::new(storage.clone()));
        let conversations = Arc::new(ConversationManager::new(
            storage.clone(),
            Arc::clone(&routing),
            Arc::clone(&directory),
            Arc::clone(&broadcaster),
            Arc::clone(&typing),
            self.strict_transitions,
        ));
        let tickets = Arc::new(TicketManager::new(
            storage.clone(),
            routing,
            directory,
            broadcaster,
            self.sla,
            self.strict_transitions,
        ));
        TestHarness {
            storage,
            registry,
            typing,
            notifier,
            conversations,
            tickets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use deskline_conversation::NewConversation;

    #[tokio::test]
    async fn harness_wires_an_isolated_engine() {
        let harness = TestHarness::new();
        harness
            .seed_agent(fixtures::agent("agent-1", &[], 0, 3))
            .await
            .unwrap();

        let conversation = harness
            .conversations
            .start(NewConversation {
                customer_id: "cust-1".into(),
                customer_name: "Ada".into(),
                customer_email: None,
                channel: "web".into(),
                subject: None,
                tags: vec![],
            })
            .await
            .unwrap();
        assert_eq!(conversation.agent_id.as_deref(), Some("agent-1"));
    }

    #[tokio::test]
    async fn observe_captures_broadcasts() {
        let harness = TestHarness::new();
        let conversation = fixtures::conversation("conv-1", &[]);
        harness.storage.create_conversation(&conversation).await.unwrap();

        let mut rx = harness.observe("conv-1", "watcher", ParticipantKind::Agent);
        harness.registry.broadcast(
            "conv-1",
            &deskline_core::events::ConversationEvent::status_change(
                "conv-1",
                deskline_core::types::ConversationStatus::Active,
            ),
            None,
        );

        let events = TestHarness::drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "status_change");
    }
}
