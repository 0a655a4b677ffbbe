// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity fixtures for tests.

use chrono::Utc;

use deskline_core::types::{
    Agent, AgentPresence, ContentKind, Conversation, ConversationStatus, Message, SenderKind,
    Ticket, TicketPriority, TicketStatus,
};

/// An online agent with the given skills and capacity.
pub fn agent(id: &str, skills: &[&str], active_chats: u32, max_concurrent_chats: u32) -> Agent {
    Agent {
        id: id.to_string(),
        name: format!("Agent {id}"),
        email: Some(format!("{id}@deskline.test")),
        presence: AgentPresence::Online,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        max_concurrent_chats,
        active_chats,
        total_chats_handled: 0,
        rating: None,
    }
}

/// A queued conversation on the `web` channel.
pub fn conversation(id: &str, tags: &[&str]) -> Conversation {
    let now = Utc::now();
    Conversation {
        id: id.to_string(),
        customer_id: "cust-1".into(),
        customer_name: "Ada Lovelace".into(),
        customer_email: Some("ada@example.com".into()),
        agent_id: None,
        agent_name: None,
        status: ConversationStatus::Queued,
        channel: "web".into(),
        subject: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        started_at: now,
        assigned_at: None,
        resolved_at: None,
        closed_at: None,
        updated_at: now,
    }
}

/// A customer text message in the given conversation.
pub fn message(id: &str, conversation_id: &str, content: &str) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: conversation_id.to_string(),
        sender_id: "cust-1".into(),
        sender_name: "Ada Lovelace".into(),
        sender_kind: SenderKind::Customer,
        content_kind: ContentKind::Text,
        content: content.to_string(),
        attachments: vec![],
        read_at: None,
        created_at: Utc::now(),
    }
}

/// An open ticket with the given priority and no SLA stamp.
pub fn ticket(id: &str, priority: TicketPriority) -> Ticket {
    let now = Utc::now();
    Ticket {
        id: id.to_string(),
        conversation_id: None,
        customer_id: "cust-1".into(),
        customer_name: "Ada Lovelace".into(),
        customer_email: Some("ada@example.com".into()),
        agent_id: None,
        team: None,
        subject: "engine trouble".into(),
        description: "the analytical engine is jammed".into(),
        priority,
        status: TicketStatus::Open,
        category: None,
        tags: vec![],
        sla_due_at: None,
        first_response_at: None,
        resolved_at: None,
        closed_at: None,
        created_at: now,
        updated_at: now,
    }
}
