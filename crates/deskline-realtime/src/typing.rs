// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typing indicator coordination with auto-expiry.
//!
//! Each active typing state is an entry in a map keyed by
//! `(conversation_id, participant_id)` holding an abortable expiry task.
//! Arming atomically replaces any prior task for the same key, and every
//! `typing=false` broadcast is gated on winning the map removal for the
//! current generation -- a manual stop racing a timer fire broadcasts at
//! most once.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use deskline_core::events::ConversationEvent;

use crate::registry::ConnectionRegistry;

/// Default expiry for a typing indicator that is not renewed or stopped.
pub const DEFAULT_TYPING_EXPIRY: Duration = Duration::from_secs(3);

type TypingKey = (String, String);

/// Per-conversation, per-participant ephemeral typing state with expiry.
pub struct TypingCoordinator {
    registry: Arc<ConnectionRegistry>,
    timers: Arc<DashMap<TypingKey, (u64, JoinHandle<()>)>>,
    expiry: Duration,
    generation: AtomicU64,
}

impl TypingCoordinator {
    /// Create a coordinator broadcasting through the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>, expiry: Duration) -> Self {
        Self {
            registry,
            timers: Arc::new(DashMap::new()),
            expiry,
            generation: AtomicU64::new(0),
        }
    }

    /// Marks a participant as typing.
    ///
    /// Broadcasts `typing=true` to the other participants and arms the
    /// expiry timer, cancelling and replacing any timer already armed for
    /// this key.
    pub fn start_typing(
        &self,
        conversation_id: &str,
        participant_id: &str,
        participant_name: Option<String>,
    ) {
        let key = (conversation_id.to_string(), participant_id.to_string());
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let timers = Arc::clone(&self.timers);
        let registry = Arc::clone(&self.registry);
        let expiry = self.expiry;
        let task_key = key.clone();
        let task_name = participant_name.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            // Only the generation that armed this timer may broadcast the
            // expiry; a newer start_typing or a manual stop has already
            // claimed the key otherwise.
            let won = timers
                .remove_if(&task_key, |_, (armed_generation, _)| {
                    *armed_generation == generation
                })
                .is_some();
            if won {
                debug!(
                    conversation_id = task_key.0.as_str(),
                    participant_id = task_key.1.as_str(),
                    "typing indicator expired"
                );
                registry.broadcast(
                    &task_key.0,
                    &ConversationEvent::typing(&task_key.0, &task_key.1, task_name, false),
                    Some(task_key.1.as_str()),
                );
            }
        });

        if let Some((_, (_, prior))) = self.timers.remove(&key) {
            prior.abort();
        }
        self.timers.insert(key, (generation, handle));

        self.registry.broadcast(
            conversation_id,
            &ConversationEvent::typing(conversation_id, participant_id, participant_name, true),
            Some(participant_id),
        );
    }

    /// Clears a participant's typing state.
    ///
    /// Cancels the expiry timer and broadcasts `typing=false`. A stop with
    /// no active typing state is a no-op, which also suppresses the
    /// automatic broadcast when racing an already-fired timer.
    pub fn stop_typing(&self, conversation_id: &str, participant_id: &str) {
        let key = (conversation_id.to_string(), participant_id.to_string());
        if let Some((_, (_, handle))) = self.timers.remove(&key) {
            handle.abort();
            self.registry.broadcast(
                conversation_id,
                &ConversationEvent::typing(conversation_id, participant_id, None, false),
                Some(participant_id),
            );
        }
    }

    /// Whether a participant currently has an active typing state.
    pub fn is_typing(&self, conversation_id: &str, participant_id: &str) -> bool {
        self.timers
            .contains_key(&(conversation_id.to_string(), participant_id.to_string()))
    }

    /// Number of active typing states.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Aborts all pending expiry timers and clears typing state.
    pub fn shutdown(&self) {
        for entry in self.timers.iter() {
            entry.value().1.abort();
        }
        let count = self.timers.len();
        self.timers.clear();
        debug!(count, "typing coordinator shut down");
    }
}

impl Drop for TypingCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
