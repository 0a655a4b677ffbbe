// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lifecycle manager.
//!
//! Owns every conversation mutation: creation with auto-assignment,
//! explicit assignment, status updates, message ingestion, read tracking,
//! transfer, and search. Persistence goes through the storage port, agent
//! load changes go through the agent directory, and every resulting state
//! change fans out through the event broadcaster.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use deskline_core::error::DesklineError;
use deskline_core::events::ConversationEvent;
use deskline_core::traits::StorageAdapter;
use deskline_core::types::{
    Agent, Attachment, ContentKind, Conversation, ConversationFilter, ConversationStatus,
    Message, SenderKind,
};
use deskline_realtime::{EventBroadcaster, TypingCoordinator};
use deskline_routing::{AgentDirectory, RoutingEngine};

use crate::transitions;

/// Sender identity used for system-authored messages.
const SYSTEM_SENDER_ID: &str = "system";
const SYSTEM_SENDER_NAME: &str = "System";

/// Input for [`ConversationManager::start`].
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub channel: String,
    pub subject: Option<String>,
    pub tags: Vec<String>,
}

/// Input for [`ConversationManager::send_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_kind: SenderKind,
    pub content_kind: ContentKind,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

/// Manages the conversation state machine and its side effects.
pub struct ConversationManager {
    storage: Arc<dyn StorageAdapter>,
    routing: Arc<RoutingEngine>,
    directory: Arc<AgentDirectory>,
    broadcaster: Arc<EventBroadcaster>,
    typing: Arc<TypingCoordinator>,
    strict_transitions: bool,
}

impl ConversationManager {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        routing: Arc<RoutingEngine>,
        directory: Arc<AgentDirectory>,
        broadcaster: Arc<EventBroadcaster>,
        typing: Arc<TypingCoordinator>,
        strict_transitions: bool,
    ) -> Self {
        Self {
            storage,
            routing,
            directory,
            broadcaster,
            typing,
            strict_transitions,
        }
    }

    /// Creates a conversation in `queued` and attempts auto-assignment.
    ///
    /// A failed or empty routing outcome leaves the conversation queued;
    /// only the creation itself can fail.
    pub async fn start(&self, new: NewConversation) -> Result<Conversation, DesklineError> {
        if new.customer_id.trim().is_empty() {
            return Err(DesklineError::validation("customer_id must not be empty"));
        }
        if new.customer_name.trim().is_empty() {
            return Err(DesklineError::validation("customer_name must not be empty"));
        }
        if new.channel.trim().is_empty() {
            return Err(DesklineError::validation("channel must not be empty"));
        }

        let now = Utc::now();
        let mut conversation = Conversation {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            agent_id: None,
            agent_name: None,
            status: ConversationStatus::Queued,
            channel: new.channel,
            subject: new.subject,
            tags: new.tags,
            started_at: now,
            assigned_at: None,
            resolved_at: None,
            closed_at: None,
            updated_at: now,
        };
        self.storage.create_conversation(&conversation).await?;
        info!(
            conversation_id = conversation.id.as_str(),
            channel = conversation.channel.as_str(),
            "conversation started"
        );

        match self.try_auto_assign(&mut conversation).await {
            Ok(true) => {}
            Ok(false) => debug!(
                conversation_id = conversation.id.as_str(),
                "no agent available, conversation stays queued"
            ),
            Err(e) => warn!(
                conversation_id = conversation.id.as_str(),
                error = %e,
                "auto-assignment failed (non-fatal)"
            ),
        }

        Ok(conversation)
    }

    /// Routing-driven assignment; `Ok(false)` is the normal
    /// nothing-assigned outcome.
    async fn try_auto_assign(
        &self,
        conversation: &mut Conversation,
    ) -> Result<bool, DesklineError> {
        let Some(candidate) = self.routing.select(&conversation.tags).await? else {
            return Ok(false);
        };
        let agent = match self.directory.reserve(&candidate.id).await {
            Ok(agent) => agent,
            // The agent filled up between selection and reservation.
            Err(DesklineError::CapacityExceeded { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        self.commit_assignment(conversation, &agent).await?;
        Ok(true)
    }

    /// Explicitly assigns a conversation to an agent.
    ///
    /// Errors with `NotFound` for a stale agent id and `CapacityExceeded`
    /// for a full agent; neither mutates anything.
    pub async fn assign(
        &self,
        conversation_id: &str,
        agent_id: &str,
    ) -> Result<Conversation, DesklineError> {
        let mut conversation = self.storage.get_conversation(conversation_id).await?;
        let agent = self.directory.reserve(agent_id).await?;
        self.commit_assignment(&mut conversation, &agent).await?;
        Ok(conversation)
    }

    /// Applies an assignment whose agent slot is already reserved.
    async fn commit_assignment(
        &self,
        conversation: &mut Conversation,
        agent: &Agent,
    ) -> Result<(), DesklineError> {
        conversation.agent_id = Some(agent.id.clone());
        conversation.agent_name = Some(agent.name.clone());
        conversation.status = ConversationStatus::Active;
        conversation.assigned_at = Some(Utc::now());
        conversation.touch();
        self.storage.update_conversation(conversation).await?;

        self.broadcaster.broadcast(&ConversationEvent::agent_assigned(
            &conversation.id,
            &agent.id,
            &agent.name,
        ));
        info!(
            conversation_id = conversation.id.as_str(),
            agent_id = agent.id.as_str(),
            active_chats = agent.active_chats,
            "agent assigned to conversation"
        );
        Ok(())
    }

    /// Sets the conversation status, stamping `resolved_at`/`closed_at` on
    /// entry and releasing the assigned agent's slot when the conversation
    /// leaves the open states.
    pub async fn update_status(
        &self,
        conversation_id: &str,
        status: ConversationStatus,
    ) -> Result<Conversation, DesklineError> {
        let mut conversation = self.storage.get_conversation(conversation_id).await?;
        transitions::check_transition(conversation.status, status, self.strict_transitions)?;
        if conversation.status == status {
            return Ok(conversation);
        }

        let was_open = matches!(
            conversation.status,
            ConversationStatus::Queued | ConversationStatus::Active
        );
        let now = Utc::now();
        match status {
            ConversationStatus::Resolved => {
                conversation.resolved_at.get_or_insert(now);
            }
            ConversationStatus::Closed => {
                conversation.closed_at.get_or_insert(now);
            }
            _ => {}
        }
        conversation.status = status;
        conversation.touch();
        self.storage.update_conversation(&conversation).await?;

        let leaving_open = was_open
            && matches!(
                status,
                ConversationStatus::Resolved | ConversationStatus::Closed
            );
        if leaving_open && let Some(agent_id) = conversation.agent_id.clone() {
            if let Err(e) = self.directory.release(&agent_id).await {
                warn!(agent_id = agent_id.as_str(), error = %e, "failed to release agent slot");
            }
        }

        self.broadcaster
            .broadcast(&ConversationEvent::status_change(&conversation.id, status));
        info!(
            conversation_id = conversation.id.as_str(),
            status = %status,
            "conversation status updated"
        );
        Ok(conversation)
    }

    /// Persists a message, touches the conversation, clears the sender's
    /// typing state, and broadcasts the `message` event.
    pub async fn send_message(&self, new: NewMessage) -> Result<Message, DesklineError> {
        if new.content.trim().is_empty() && new.attachments.is_empty() {
            return Err(DesklineError::validation(
                "message content must not be empty",
            ));
        }
        if new.sender_id.trim().is_empty() {
            return Err(DesklineError::validation("sender_id must not be empty"));
        }

        let mut conversation = self.storage.get_conversation(&new.conversation_id).await?;
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: new.conversation_id,
            sender_id: new.sender_id,
            sender_name: new.sender_name,
            sender_kind: new.sender_kind,
            content_kind: new.content_kind,
            content: new.content,
            attachments: new.attachments,
            read_at: None,
            created_at: Utc::now(),
        };
        self.storage.insert_message(&message).await?;

        conversation.touch();
        self.storage.update_conversation(&conversation).await?;

        self.typing
            .stop_typing(&message.conversation_id, &message.sender_id);
        self.broadcaster
            .broadcast(&ConversationEvent::message(message.clone()));
        debug!(
            conversation_id = message.conversation_id.as_str(),
            message_id = message.id.as_str(),
            sender_kind = %message.sender_kind,
            "message sent"
        );
        Ok(message)
    }

    /// Stamps a message's read timestamp once.
    ///
    /// Re-marking an already-read message is a domain-level no-op: the
    /// timestamp keeps its first value and no second `read` event is
    /// emitted.
    pub async fn mark_read(
        &self,
        message_id: &str,
        reader_id: Option<&str>,
    ) -> Result<Message, DesklineError> {
        let mut message = self.storage.get_message(message_id).await?;
        if message.read_at.is_some() {
            return Ok(message);
        }
        message.read_at = Some(Utc::now());
        self.storage.update_message(&message).await?;

        self.broadcaster.broadcast(&ConversationEvent::read(
            &message.conversation_id,
            &message.id,
            reader_id.map(str::to_string),
        ));
        Ok(message)
    }

    /// Marks every unread message in the conversation as read.
    ///
    /// Returns the number of messages newly marked; already-read messages
    /// are skipped and re-emit nothing.
    pub async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        reader_id: Option<&str>,
    ) -> Result<usize, DesklineError> {
        // Existence check so a stale id errors rather than reporting zero.
        self.storage.get_conversation(conversation_id).await?;

        let messages = self.storage.list_messages(conversation_id, None).await?;
        let mut marked = 0;
        for mut message in messages {
            if message.read_at.is_some() {
                continue;
            }
            message.read_at = Some(Utc::now());
            self.storage.update_message(&message).await?;
            self.broadcaster.broadcast(&ConversationEvent::read(
                conversation_id,
                &message.id,
                reader_id.map(str::to_string),
            ));
            marked += 1;
        }
        debug!(conversation_id, marked, "conversation marked read");
        Ok(marked)
    }

    /// Moves a conversation from one agent to another.
    ///
    /// The target agent's slot is reserved before anything else mutates,
    /// so a full target leaves both agents and the conversation untouched.
    /// The source agent's release clamps at zero. A system message
    /// announces the transfer to the conversation.
    pub async fn transfer(
        &self,
        conversation_id: &str,
        from_agent_id: &str,
        to_agent_id: &str,
    ) -> Result<Conversation, DesklineError> {
        let mut conversation = self.storage.get_conversation(conversation_id).await?;
        let from_agent = self.storage.get_agent(from_agent_id).await?;

        let to_agent = self.directory.reserve(to_agent_id).await?;
        if let Err(e) = self.directory.release(from_agent_id).await {
            warn!(
                agent_id = from_agent_id,
                error = %e,
                "failed to release transferring agent"
            );
        }

        self.commit_assignment(&mut conversation, &to_agent).await?;
        self.append_system_message(
            &conversation.id,
            format!(
                "Conversation transferred from {} to {}",
                from_agent.name, to_agent.name
            ),
        )
        .await?;

        info!(
            conversation_id,
            from_agent_id, to_agent_id, "conversation transferred"
        );
        Ok(conversation)
    }

    /// Case-insensitive substring search over customer name, customer
    /// email, and subject. No ranking.
    pub async fn search(
        &self,
        query: &str,
        filter: Option<&ConversationFilter>,
    ) -> Result<Vec<Conversation>, DesklineError> {
        let default_filter = ConversationFilter::default();
        let filter = filter.unwrap_or(&default_filter);
        let needle = query.to_lowercase();
        let mut conversations = self.storage.list_conversations(filter).await?;
        conversations.retain(|c| {
            c.customer_name.to_lowercase().contains(&needle)
                || c.customer_email
                    .as_ref()
                    .is_some_and(|email| email.to_lowercase().contains(&needle))
                || c.subject
                    .as_ref()
                    .is_some_and(|subject| subject.to_lowercase().contains(&needle))
        });
        Ok(conversations)
    }

    /// Fetches one conversation.
    pub async fn get(&self, conversation_id: &str) -> Result<Conversation, DesklineError> {
        self.storage.get_conversation(conversation_id).await
    }

    /// Lists conversations through the storage filter.
    pub async fn list(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>, DesklineError> {
        self.storage.list_conversations(filter).await
    }

    /// Inserts and broadcasts a system-authored message.
    async fn append_system_message(
        &self,
        conversation_id: &str,
        content: String,
    ) -> Result<Message, DesklineError> {
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: SYSTEM_SENDER_ID.to_string(),
            sender_name: SYSTEM_SENDER_NAME.to_string(),
            sender_kind: SenderKind::System,
            content_kind: ContentKind::System,
            content,
            attachments: vec![],
            read_at: None,
            created_at: Utc::now(),
        };
        self.storage.insert_message(&message).await?;
        self.broadcaster
            .broadcast(&ConversationEvent::message(message.clone()));
        Ok(message)
    }
}
