// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain entities and query filters for the Deskline engine.
//!
//! Wire-facing structs serialize with camelCase field names to match the
//! realtime event schema (`conversationId`, `slaDueAt`, ...). Status and
//! priority enums serialize as snake_case strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Queued,
    Active,
    Resolved,
    Closed,
}

/// Presence status of a support agent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AgentPresence {
    Online,
    Away,
    Busy,
    Offline,
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    Customer,
    Agent,
    System,
}

/// Content type of a message body.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Image,
    File,
    System,
}

/// Lifecycle status of a support ticket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Waiting,
    Resolved,
    Closed,
}

/// Ticket priority, which determines the SLA deadline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Kind of participant attached to a live connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Customer,
    Agent,
}

/// Health status reported by port health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Port is fully operational.
    Healthy,
    /// Port is operational but experiencing issues.
    Degraded(String),
    /// Port is not operational.
    Unhealthy(String),
}

/// A live support interaction between a customer and (optionally) an agent.
///
/// `agent_id` is set if and only if an assignment has occurred and the
/// conversation has left `queued`. `resolved_at`/`closed_at` are stamped
/// when the status enters the corresponding state and are never cleared.
/// `updated_at` is monotonically non-decreasing; mutate it through
/// [`Conversation::touch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub status: ConversationStatus,
    pub channel: String,
    pub subject: Option<String>,
    pub tags: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Advances `updated_at` to now, never moving it backwards.
    pub fn touch(&mut self) {
        self.updated_at = self.updated_at.max(Utc::now());
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
}

/// A single message within a conversation.
///
/// Immutable after creation except for `read_at`, which transitions once
/// from unset to set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_kind: SenderKind,
    pub content_kind: ContentKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A support representative with presence, skills, and a capacity limit.
///
/// `active_chats` must equal the number of conversations and tickets
/// currently assigned to this agent that have not yet been resolved,
/// closed, or transferred away. All mutations of the counter go through
/// the agent directory, which clamps releases at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub presence: AgentPresence,
    pub skills: Vec<String>,
    pub max_concurrent_chats: u32,
    pub active_chats: u32,
    pub total_chats_handled: u64,
    pub rating: Option<f32>,
}

impl Agent {
    /// Whether the agent can accept one more conversation or ticket.
    pub fn has_capacity(&self) -> bool {
        self.active_chats < self.max_concurrent_chats
    }
}

/// A tracked support issue with a priority and an SLA deadline.
///
/// `sla_due_at` is always `created_at + SLA(priority)`; a priority change
/// recomputes it from the original `created_at`, not from the change time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub conversation_id: Option<String>,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub agent_id: Option<String>,
    pub team: Option<String>,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub sla_due_at: Option<DateTime<Utc>>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Advances `updated_at` to now, never moving it backwards.
    pub fn touch(&mut self) {
        self.updated_at = self.updated_at.max(Utc::now());
    }
}

/// Query filter for conversation listings.
///
/// Results are ordered by start time descending.
#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    pub status: Option<ConversationStatus>,
    pub agent_id: Option<String>,
    pub customer_id: Option<String>,
    pub channel: Option<String>,
    /// Matches conversations whose tag set contains this tag.
    pub tag: Option<String>,
    pub started_after: Option<DateTime<Utc>>,
    pub started_before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Query filter for ticket listings.
///
/// Results are ordered by creation time descending.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub agent_id: Option<String>,
    pub customer_id: Option<String>,
    pub category: Option<String>,
    /// Matches tickets whose tag set contains this tag.
    pub tag: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Query filter for agent listings.
///
/// Agents are returned in creation order (oldest first) so that routing
/// tie-breaks are deterministic.
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub presence: Option<AgentPresence>,
    /// Matches agents whose skill set contains this skill.
    pub skill: Option<String>,
}
