// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain event fan-out and best-effort outbound notifications.
//!
//! The broadcaster is the single place that serializes domain events into
//! the wire envelope and hands them to the connection registry. It also
//! wraps the notifier port: notification sends happen after the triggering
//! domain mutation has committed, and their failures are logged and
//! swallowed -- the core's success/failure contract never depends on a
//! notification outcome.

use std::sync::Arc;

use tracing::{debug, warn};

use deskline_core::events::ConversationEvent;
use deskline_core::traits::notify::{Notifier, SMS_MAX_LEN};

use crate::registry::ConnectionRegistry;

/// Serializes domain events and fans them out; emits best-effort
/// notifications to external senders.
pub struct EventBroadcaster {
    registry: Arc<ConnectionRegistry>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self { registry, notifier }
    }

    /// Fans an event out to every open connection of its conversation.
    pub fn broadcast(&self, event: &ConversationEvent) -> usize {
        self.registry.broadcast(&event.conversation_id, event, None)
    }

    /// Fans an event out, skipping one participant (typically the sender).
    pub fn broadcast_excluding(&self, event: &ConversationEvent, exclude: &str) -> usize {
        self.registry
            .broadcast(&event.conversation_id, event, Some(exclude))
    }

    /// Delivers an event to a single participant, if connected.
    pub fn send_to(&self, participant_id: &str, event: &ConversationEvent) -> bool {
        self.registry
            .send(&event.conversation_id, participant_id, event)
    }

    /// Sends an email without surfacing failures to the caller.
    pub async fn email_best_effort(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        html_body: Option<&str>,
    ) {
        let Some(notifier) = &self.notifier else {
            debug!(to, "no notifier configured, skipping email");
            return;
        };
        if let Err(e) = notifier.send_email(to, subject, body, html_body).await {
            warn!(to, subject, error = %e, "email notification failed");
        }
    }

    /// Sends an SMS without surfacing failures to the caller.
    ///
    /// Messages longer than the contract's 160-character limit are
    /// truncated before sending.
    pub async fn sms_best_effort(&self, to: &str, message: &str) {
        let Some(notifier) = &self.notifier else {
            debug!(to, "no notifier configured, skipping SMS");
            return;
        };
        let message = truncate_sms(message);
        if let Err(e) = notifier.send_sms(to, message).await {
            warn!(to, error = %e, "SMS notification failed");
        }
    }
}

/// Truncate a message to the SMS length limit on a char boundary.
fn truncate_sms(message: &str) -> &str {
    match message.char_indices().nth(SMS_MAX_LEN) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deskline_core::error::DesklineError;
    use deskline_core::types::{ConversationStatus, ParticipantKind};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RecordingNotifier {
        emails: Mutex<Vec<(String, String)>>,
        sms: Mutex<Vec<(String, String)>>,
        failing: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_email(
            &self,
            to: &str,
            subject: &str,
            _body: &str,
            _html_body: Option<&str>,
        ) -> Result<(), DesklineError> {
            if self.failing {
                return Err(DesklineError::Notification {
                    message: "smtp refused".into(),
                    source: None,
                });
            }
            self.emails
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }

        async fn send_sms(&self, to: &str, message: &str) -> Result<(), DesklineError> {
            if self.failing {
                return Err(DesklineError::Notification {
                    message: "carrier unreachable".into(),
                    source: None,
                });
            }
            self.sms
                .lock()
                .unwrap()
                .push((to.to_string(), message.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_attached_connections() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, mut rx) = mpsc::channel(8);
        registry.attach("conv-1", "cust-1", ParticipantKind::Customer, tx);

        let broadcaster = EventBroadcaster::new(registry, None);
        let delivered = broadcaster.broadcast(&ConversationEvent::status_change(
            "conv-1",
            ConversationStatus::Active,
        ));
        assert_eq!(delivered, 1);
        assert!(rx.try_recv().unwrap().contains("status_change"));
    }

    #[tokio::test]
    async fn notifier_failure_is_swallowed() {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = Arc::new(RecordingNotifier {
            failing: true,
            ..Default::default()
        });
        let broadcaster = EventBroadcaster::new(registry, Some(notifier.clone()));

        // Must not panic or propagate.
        broadcaster
            .email_best_effort("ada@example.com", "subject", "body", None)
            .await;
        broadcaster.sms_best_effort("+15550100", "hello").await;
        assert!(notifier.emails.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_notifier_is_a_noop() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = EventBroadcaster::new(registry, None);
        broadcaster
            .email_best_effort("ada@example.com", "subject", "body", None)
            .await;
    }

    #[tokio::test]
    async fn sms_is_truncated_to_the_contract_limit() {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let broadcaster = EventBroadcaster::new(registry, Some(notifier.clone()));

        let long = "x".repeat(200);
        broadcaster.sms_best_effort("+15550100", &long).await;

        let sent = notifier.sms.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.len(), SMS_MAX_LEN);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let message = "é".repeat(200);
        let truncated = truncate_sms(&message);
        assert_eq!(truncated.chars().count(), SMS_MAX_LEN);
    }
}
