// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage port consumed by the lifecycle managers and the routing engine.
//!
//! Persistence is an external collaborator: this engine only depends on the
//! contract below. Callers must not assume a mutation succeeded without
//! checking the returned result; persistence failures are propagated as
//! [`DesklineError::Storage`] and never retried here.

use async_trait::async_trait;

use crate::error::DesklineError;
use crate::types::{
    Agent, AgentFilter, Conversation, ConversationFilter, HealthStatus, Message, Ticket,
    TicketFilter,
};

/// Port for conversation, message, agent, and ticket persistence.
///
/// `get_*` returns [`DesklineError::NotFound`] for unknown ids. List
/// results are ordered by creation time descending, except messages
/// (chronological within their conversation) and agents (creation order,
/// oldest first, so routing tie-breaks stay deterministic).
#[async_trait]
pub trait StorageAdapter: Send + Sync + 'static {
    /// Initializes the storage backend (connections, migrations, ...).
    async fn initialize(&self) -> Result<(), DesklineError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), DesklineError>;

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, DesklineError>;

    async fn create_conversation(&self, conversation: &Conversation)
    -> Result<(), DesklineError>;
    async fn get_conversation(&self, id: &str) -> Result<Conversation, DesklineError>;
    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>, DesklineError>;
    async fn update_conversation(&self, conversation: &Conversation)
    -> Result<(), DesklineError>;

    async fn insert_message(&self, message: &Message) -> Result<(), DesklineError>;
    async fn get_message(&self, id: &str) -> Result<Message, DesklineError>;
    /// Messages of one conversation in chronological order. A limit keeps
    /// only the most recent `limit` messages (still chronological).
    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, DesklineError>;
    async fn update_message(&self, message: &Message) -> Result<(), DesklineError>;

    async fn create_agent(&self, agent: &Agent) -> Result<(), DesklineError>;
    async fn get_agent(&self, id: &str) -> Result<Agent, DesklineError>;
    async fn list_agents(&self, filter: &AgentFilter) -> Result<Vec<Agent>, DesklineError>;
    async fn update_agent(&self, agent: &Agent) -> Result<(), DesklineError>;

    async fn create_ticket(&self, ticket: &Ticket) -> Result<(), DesklineError>;
    async fn get_ticket(&self, id: &str) -> Result<Ticket, DesklineError>;
    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, DesklineError>;
    async fn update_ticket(&self, ticket: &Ticket) -> Result<(), DesklineError>;
}
