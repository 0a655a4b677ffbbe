// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete Deskline engine.
//!
//! Each test creates an isolated TestHarness with in-memory storage, mock
//! notifier, and all required subsystems. Tests are independent and
//! order-insensitive.

use std::time::Duration;

use deskline_conversation::{NewConversation, NewMessage};
use deskline_core::StorageAdapter;
use deskline_core::types::{
    ContentKind, ConversationStatus, ParticipantKind, SenderKind, TicketPriority, TicketStatus,
};
use deskline_test_utils::{TestHarness, fixtures};
use deskline_ticket::NewTicket;

fn web_conversation(tags: &[&str]) -> NewConversation {
    NewConversation {
        customer_id: "cust-1".into(),
        customer_name: "Ada Lovelace".into(),
        customer_email: Some("ada@example.com".into()),
        channel: "web".into(),
        subject: Some("billing question".into()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn urgent_ticket() -> NewTicket {
    NewTicket {
        conversation_id: None,
        customer_id: "cust-1".into(),
        customer_name: "Ada Lovelace".into(),
        customer_email: Some("ada@example.com".into()),
        subject: "engine down".into(),
        description: "production outage".into(),
        priority: Some(TicketPriority::Urgent),
        category: None,
        tags: vec![],
        team: None,
    }
}

// ---- Conversation routing ----

#[tokio::test]
async fn billing_conversation_routes_to_billing_agent() {
    let harness = TestHarness::new();
    harness
        .seed_agent(fixtures::agent("billing-1", &["billing"], 0, 3))
        .await
        .unwrap();

    let conversation = harness
        .conversations
        .start(web_conversation(&["billing"]))
        .await
        .unwrap();

    assert_eq!(conversation.status, ConversationStatus::Active);
    assert_eq!(conversation.agent_id.as_deref(), Some("billing-1"));

    let agent = harness.storage.get_agent("billing-1").await.unwrap();
    assert_eq!(agent.active_chats, 1);
}

#[tokio::test]
async fn conversation_without_online_agents_stays_queued() {
    let harness = TestHarness::new();
    let conversation = harness
        .conversations
        .start(web_conversation(&[]))
        .await
        .unwrap();
    assert_eq!(conversation.status, ConversationStatus::Queued);
    assert!(conversation.agent_id.is_none());
}

// ---- Realtime fan-out ----

#[tokio::test]
async fn message_fans_out_to_open_connections_only() {
    let harness = TestHarness::new();
    let conversation = harness
        .conversations
        .start(web_conversation(&[]))
        .await
        .unwrap();

    let mut customer_rx = harness.observe(&conversation.id, "cust-1", ParticipantKind::Customer);
    let mut agent_rx = harness.observe(&conversation.id, "agent-1", ParticipantKind::Agent);
    // A third participant whose receiving side is already gone.
    let dead_rx = harness.observe(&conversation.id, "ghost", ParticipantKind::Agent);
    drop(dead_rx);

    harness
        .conversations
        .send_message(NewMessage {
            conversation_id: conversation.id.clone(),
            sender_id: "cust-1".into(),
            sender_name: "Ada Lovelace".into(),
            sender_kind: SenderKind::Customer,
            content_kind: ContentKind::Text,
            content: "is anyone there?".into(),
            attachments: vec![],
        })
        .await
        .unwrap();

    let customer_events = TestHarness::drain(&mut customer_rx);
    let agent_events = TestHarness::drain(&mut agent_rx);
    assert_eq!(customer_events.len(), 1);
    assert_eq!(agent_events.len(), 1);
    assert_eq!(agent_events[0]["type"], "message");
    assert_eq!(agent_events[0]["data"]["content"], "is anyone there?");
    assert_eq!(agent_events[0]["conversationId"], conversation.id);
}

#[tokio::test(start_paused = true)]
async fn typing_indicator_expires_once() {
    let harness = TestHarness::new();
    let conversation = harness
        .conversations
        .start(web_conversation(&[]))
        .await
        .unwrap();
    let mut agent_rx = harness.observe(&conversation.id, "agent-1", ParticipantKind::Agent);

    harness.typing.start_typing(&conversation.id, "cust-1", None);
    tokio::time::sleep(Duration::from_secs(5)).await;

    let events = TestHarness::drain(&mut agent_rx);
    let flags: Vec<bool> = events
        .iter()
        .filter(|e| e["type"] == "typing")
        .map(|e| e["data"]["isTyping"].as_bool().unwrap())
        .collect();
    assert_eq!(flags, vec![true, false]);
}

#[tokio::test]
async fn sending_a_message_stops_the_typing_indicator() {
    let harness = TestHarness::new();
    let conversation = harness
        .conversations
        .start(web_conversation(&[]))
        .await
        .unwrap();

    harness.typing.start_typing(&conversation.id, "cust-1", None);
    harness
        .conversations
        .send_message(NewMessage {
            conversation_id: conversation.id.clone(),
            sender_id: "cust-1".into(),
            sender_name: "Ada Lovelace".into(),
            sender_kind: SenderKind::Customer,
            content_kind: ContentKind::Text,
            content: "done typing".into(),
            attachments: vec![],
        })
        .await
        .unwrap();

    assert!(!harness.typing.is_typing(&conversation.id, "cust-1"));
}

// ---- Ticket SLA ----

#[tokio::test]
async fn urgent_ticket_gets_one_hour_sla_and_auto_assignment() {
    let harness = TestHarness::new();
    harness
        .seed_agent(fixtures::agent("agent-1", &[], 0, 3))
        .await
        .unwrap();

    let ticket = harness.tickets.create(urgent_ticket()).await.unwrap();
    assert_eq!(
        ticket.sla_due_at.unwrap(),
        ticket.created_at + chrono::Duration::hours(1)
    );
    assert_eq!(ticket.status, TicketStatus::InProgress);
    assert_eq!(ticket.agent_id.as_deref(), Some("agent-1"));

    // Fresh ticket is not overdue and has time remaining.
    assert!(!harness.tickets.is_overdue(&ticket));
    assert!(harness.tickets.time_until_breach(&ticket).unwrap() > chrono::Duration::zero());
}

#[tokio::test]
async fn overdue_ticket_is_detected_after_the_deadline() {
    let harness = TestHarness::new();
    let ticket = harness.tickets.create(urgent_ticket()).await.unwrap();

    // Backdate the deadline past now, as if an hour has elapsed.
    let mut stored = harness.storage.get_ticket(&ticket.id).await.unwrap();
    stored.sla_due_at = Some(chrono::Utc::now() - chrono::Duration::seconds(1));
    harness.storage.update_ticket(&stored).await.unwrap();

    let overdue = harness.storage.get_ticket(&ticket.id).await.unwrap();
    assert!(harness.tickets.is_overdue(&overdue));
    assert_eq!(
        harness.tickets.time_until_breach(&overdue).unwrap(),
        chrono::Duration::zero()
    );

    // Resolving clears the overdue condition.
    harness
        .tickets
        .update_status(&ticket.id, TicketStatus::Resolved)
        .await
        .unwrap();
    let resolved = harness.storage.get_ticket(&ticket.id).await.unwrap();
    assert!(!harness.tickets.is_overdue(&resolved));
}

#[tokio::test]
async fn ticket_lifecycle_keeps_agent_load_balanced() {
    let harness = TestHarness::new();
    harness
        .seed_agent(fixtures::agent("agent-1", &[], 0, 5))
        .await
        .unwrap();

    let ticket = harness.tickets.create(urgent_ticket()).await.unwrap();
    assert_eq!(
        harness
            .storage
            .get_agent("agent-1")
            .await
            .unwrap()
            .active_chats,
        1
    );

    harness
        .tickets
        .update_status(&ticket.id, TicketStatus::Resolved)
        .await
        .unwrap();
    assert_eq!(
        harness
            .storage
            .get_agent("agent-1")
            .await
            .unwrap()
            .active_chats,
        0
    );
}

// ---- Notifications ----

#[tokio::test]
async fn ticket_creation_notifies_the_customer() {
    let harness = TestHarness::new();
    harness.tickets.create(urgent_ticket()).await.unwrap();

    let emails = harness.notifier.sent_emails();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "ada@example.com");
    assert!(emails[0].subject.starts_with("Ticket received"));
}

#[tokio::test]
async fn failing_notifier_never_fails_the_operation() {
    let harness = TestHarness::new();
    harness.notifier.set_failing(true);

    let ticket = harness.tickets.create(urgent_ticket()).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert!(harness.notifier.sent_emails().is_empty());
}

// ---- Mixed conversation + ticket flow ----

#[tokio::test]
async fn conversation_linked_ticket_broadcasts_assignment() {
    let harness = TestHarness::new();
    let conversation = harness
        .conversations
        .start(web_conversation(&[]))
        .await
        .unwrap();
    harness
        .seed_agent(fixtures::agent("agent-1", &[], 0, 3))
        .await
        .unwrap();
    let mut rx = harness.observe(&conversation.id, "cust-1", ParticipantKind::Customer);

    let mut new = urgent_ticket();
    new.conversation_id = Some(conversation.id.clone());
    harness.tickets.create(new).await.unwrap();

    let events = TestHarness::drain(&mut rx);
    assert!(
        events
            .iter()
            .any(|e| e["type"] == "agent_assigned" && e["data"]["agentId"] == "agent-1")
    );
}

#[tokio::test]
async fn transfer_keeps_counters_consistent_end_to_end() {
    let harness = TestHarness::new();
    harness
        .seed_agent(fixtures::agent("agent-a", &[], 0, 3))
        .await
        .unwrap();
    let conversation = harness
        .conversations
        .start(web_conversation(&[]))
        .await
        .unwrap();
    harness
        .seed_agent(fixtures::agent("agent-b", &[], 0, 3))
        .await
        .unwrap();

    harness
        .conversations
        .transfer(&conversation.id, "agent-a", "agent-b")
        .await
        .unwrap();

    assert_eq!(
        harness
            .storage
            .get_agent("agent-a")
            .await
            .unwrap()
            .active_chats,
        0
    );
    assert_eq!(
        harness
            .storage
            .get_agent("agent-b")
            .await
            .unwrap()
            .active_chats,
        1
    );

    let messages = harness
        .storage
        .list_messages(&conversation.id, None)
        .await
        .unwrap();
    assert!(messages.iter().any(|m| m.content.contains("transferred")));
}
