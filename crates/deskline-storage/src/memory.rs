// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of the storage port.
//!
//! Tables are plain vectors behind one async RwLock, which satisfies the
//! contract's single-process model: list results are filtered and ordered
//! on read, and every mutation is atomic with respect to other storage
//! calls. Durable persistence stays an external concern; this store backs
//! tests and single-node deployments.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use deskline_core::error::DesklineError;
use deskline_core::traits::StorageAdapter;
use deskline_core::types::{
    Agent, AgentFilter, Conversation, ConversationFilter, HealthStatus, Message, Ticket,
    TicketFilter,
};

#[derive(Debug, Default)]
struct Tables {
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    agents: Vec<Agent>,
    tickets: Vec<Ticket>,
}

/// Process-local storage backing the engine.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

fn duplicate(entity: &'static str, id: &str) -> DesklineError {
    DesklineError::storage(format!("{entity} already exists: {id}"))
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), DesklineError> {
        debug!("in-memory storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DesklineError> {
        debug!("in-memory storage closed");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, DesklineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), DesklineError> {
        let mut tables = self.tables.write().await;
        if tables.conversations.iter().any(|c| c.id == conversation.id) {
            return Err(duplicate("conversation", &conversation.id));
        }
        tables.conversations.push(conversation.clone());
        Ok(())
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, DesklineError> {
        self.tables
            .read()
            .await
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| DesklineError::not_found("conversation", id))
    }

    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>, DesklineError> {
        let tables = self.tables.read().await;
        let mut results: Vec<Conversation> = tables
            .conversations
            .iter()
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .filter(|c| {
                filter
                    .agent_id
                    .as_ref()
                    .is_none_or(|a| c.agent_id.as_ref() == Some(a))
            })
            .filter(|c| {
                filter
                    .customer_id
                    .as_ref()
                    .is_none_or(|cid| &c.customer_id == cid)
            })
            .filter(|c| filter.channel.as_ref().is_none_or(|ch| &c.channel == ch))
            .filter(|c| filter.tag.as_ref().is_none_or(|t| c.tags.contains(t)))
            .filter(|c| filter.started_after.is_none_or(|t| c.started_at >= t))
            .filter(|c| filter.started_before.is_none_or(|t| c.started_at <= t))
            .cloned()
            .collect();
        // Stable sort keeps insertion order within equal timestamps.
        results.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(paginate(results, filter.offset, filter.limit))
    }

    async fn update_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), DesklineError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation.id)
            .ok_or_else(|| DesklineError::not_found("conversation", &conversation.id))?;
        *slot = conversation.clone();
        Ok(())
    }

    async fn insert_message(&self, message: &Message) -> Result<(), DesklineError> {
        let mut tables = self.tables.write().await;
        if tables.messages.iter().any(|m| m.id == message.id) {
            return Err(duplicate("message", &message.id));
        }
        tables.messages.push(message.clone());
        Ok(())
    }

    async fn get_message(&self, id: &str) -> Result<Message, DesklineError> {
        self.tables
            .read()
            .await
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| DesklineError::not_found("message", id))
    }

    async fn list_messages(
        &self,
        conversation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, DesklineError> {
        let tables = self.tables.read().await;
        let mut results: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if let Some(limit) = limit
            && results.len() > limit
        {
            results.drain(..results.len() - limit);
        }
        Ok(results)
    }

    async fn update_message(&self, message: &Message) -> Result<(), DesklineError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .messages
            .iter_mut()
            .find(|m| m.id == message.id)
            .ok_or_else(|| DesklineError::not_found("message", &message.id))?;
        *slot = message.clone();
        Ok(())
    }

    async fn create_agent(&self, agent: &Agent) -> Result<(), DesklineError> {
        let mut tables = self.tables.write().await;
        if tables.agents.iter().any(|a| a.id == agent.id) {
            return Err(duplicate("agent", &agent.id));
        }
        tables.agents.push(agent.clone());
        Ok(())
    }

    async fn get_agent(&self, id: &str) -> Result<Agent, DesklineError> {
        self.tables
            .read()
            .await
            .agents
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| DesklineError::not_found("agent", id))
    }

    async fn list_agents(&self, filter: &AgentFilter) -> Result<Vec<Agent>, DesklineError> {
        let tables = self.tables.read().await;
        // Creation order, oldest first: routing tie-breaks depend on it.
        Ok(tables
            .agents
            .iter()
            .filter(|a| filter.presence.is_none_or(|p| a.presence == p))
            .filter(|a| filter.skill.as_ref().is_none_or(|s| a.skills.contains(s)))
            .cloned()
            .collect())
    }

    async fn update_agent(&self, agent: &Agent) -> Result<(), DesklineError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .agents
            .iter_mut()
            .find(|a| a.id == agent.id)
            .ok_or_else(|| DesklineError::not_found("agent", &agent.id))?;
        *slot = agent.clone();
        Ok(())
    }

    async fn create_ticket(&self, ticket: &Ticket) -> Result<(), DesklineError> {
        let mut tables = self.tables.write().await;
        if tables.tickets.iter().any(|t| t.id == ticket.id) {
            return Err(duplicate("ticket", &ticket.id));
        }
        tables.tickets.push(ticket.clone());
        Ok(())
    }

    async fn get_ticket(&self, id: &str) -> Result<Ticket, DesklineError> {
        self.tables
            .read()
            .await
            .tickets
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| DesklineError::not_found("ticket", id))
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, DesklineError> {
        let tables = self.tables.read().await;
        let mut results: Vec<Ticket> = tables
            .tickets
            .iter()
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| {
                filter
                    .agent_id
                    .as_ref()
                    .is_none_or(|a| t.agent_id.as_ref() == Some(a))
            })
            .filter(|t| {
                filter
                    .customer_id
                    .as_ref()
                    .is_none_or(|cid| &t.customer_id == cid)
            })
            .filter(|t| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|cat| t.category.as_ref() == Some(cat))
            })
            .filter(|t| filter.tag.as_ref().is_none_or(|tag| t.tags.contains(tag)))
            .filter(|t| filter.created_after.is_none_or(|at| t.created_at >= at))
            .filter(|t| filter.created_before.is_none_or(|at| t.created_at <= at))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(results, filter.offset, filter.limit))
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<(), DesklineError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket.id)
            .ok_or_else(|| DesklineError::not_found("ticket", &ticket.id))?;
        *slot = ticket.clone();
        Ok(())
    }
}

fn paginate<T>(mut results: Vec<T>, offset: Option<usize>, limit: Option<usize>) -> Vec<T> {
    if let Some(offset) = offset {
        if offset >= results.len() {
            return Vec::new();
        }
        results.drain(..offset);
    }
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    results
}
