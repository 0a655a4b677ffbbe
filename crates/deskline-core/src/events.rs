// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime event schemas.
//!
//! Outbound events fan out to live connections as
//! `{"type", "conversationId", "data", "timestamp"}` envelopes where the
//! shape of `data` depends on `type`. Inbound frames arrive from clients
//! as `{"type", "data"}` objects; `ping` receives a `pong` reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{ConversationStatus, Message};

/// Outbound event types fanned out to a conversation's live connections.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Message,
    Typing,
    Read,
    AgentAssigned,
    StatusChange,
}

/// Payload of a `typing` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingData {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub is_typing: bool,
}

/// Payload of a `read` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadData {
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Payload of an `agent_assigned` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAssignedData {
    pub agent_id: String,
    pub agent_name: String,
}

/// Payload of a `status_change` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeData {
    pub status: ConversationStatus,
}

/// Type-dependent event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    Message(Box<Message>),
    Typing(TypingData),
    Read(ReadData),
    AgentAssigned(AgentAssignedData),
    StatusChange(StatusChangeData),
}

/// Envelope for every outbound realtime event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub conversation_id: String,
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEvent {
    fn new(event_type: EventType, conversation_id: &str, data: EventData) -> Self {
        Self {
            event_type,
            conversation_id: conversation_id.to_string(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// A new message was posted to the conversation.
    pub fn message(message: Message) -> Self {
        let conversation_id = message.conversation_id.clone();
        Self::new(
            EventType::Message,
            &conversation_id,
            EventData::Message(Box::new(message)),
        )
    }

    /// A participant started or stopped composing a message.
    pub fn typing(
        conversation_id: &str,
        user_id: &str,
        user_name: Option<String>,
        is_typing: bool,
    ) -> Self {
        Self::new(
            EventType::Typing,
            conversation_id,
            EventData::Typing(TypingData {
                user_id: user_id.to_string(),
                user_name,
                is_typing,
            }),
        )
    }

    /// A message was marked as read.
    pub fn read(conversation_id: &str, message_id: &str, user_id: Option<String>) -> Self {
        Self::new(
            EventType::Read,
            conversation_id,
            EventData::Read(ReadData {
                message_id: message_id.to_string(),
                user_id,
            }),
        )
    }

    /// An agent was assigned to the conversation.
    pub fn agent_assigned(conversation_id: &str, agent_id: &str, agent_name: &str) -> Self {
        Self::new(
            EventType::AgentAssigned,
            conversation_id,
            EventData::AgentAssigned(AgentAssignedData {
                agent_id: agent_id.to_string(),
                agent_name: agent_name.to_string(),
            }),
        )
    }

    /// The conversation's status changed.
    pub fn status_change(conversation_id: &str, status: ConversationStatus) -> Self {
        Self::new(
            EventType::StatusChange,
            conversation_id,
            EventData::StatusChange(StatusChangeData { status }),
        )
    }
}

/// Payload of inbound `typing`/`stop_typing` frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingFrame {
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Payload of an inbound `read` frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFrame {
    pub message_id: String,
}

/// A frame received from a client over the persistent connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Typing { data: TypingFrame },
    StopTyping { data: TypingFrame },
    Read { data: ReadFrame },
    Ping,
}

/// Reply to an inbound `ping` frame.
#[derive(Debug, Clone, Serialize)]
pub struct Pong {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl Pong {
    pub fn now() -> Self {
        Self {
            frame_type: "pong",
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentKind, SenderKind};

    fn sample_message() -> Message {
        Message {
            id: "msg-1".into(),
            conversation_id: "conv-1".into(),
            sender_id: "cust-1".into(),
            sender_name: "Ada".into(),
            sender_kind: SenderKind::Customer,
            content_kind: ContentKind::Text,
            content: "hello".into(),
            attachments: vec![],
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn message_event_envelope_shape() {
        let event = ConversationEvent::message(sample_message());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["conversationId"], "conv-1");
        assert_eq!(json["data"]["content"], "hello");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn typing_event_payload_shape() {
        let event = ConversationEvent::typing("conv-1", "cust-1", Some("Ada".into()), true);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "typing");
        assert_eq!(json["data"]["userId"], "cust-1");
        assert_eq!(json["data"]["userName"], "Ada");
        assert_eq!(json["data"]["isTyping"], true);
    }

    #[test]
    fn read_event_omits_absent_user() {
        let event = ConversationEvent::read("conv-1", "msg-1", None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["messageId"], "msg-1");
        assert!(json["data"].get("userId").is_none());
    }

    #[test]
    fn status_change_payload() {
        let event = ConversationEvent::status_change("conv-1", ConversationStatus::Active);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_change");
        assert_eq!(json["data"]["status"], "active");
    }

    #[test]
    fn inbound_typing_frame_deserializes() {
        let json = r#"{"type": "typing", "data": {"userId": "u1", "userName": "Ada"}}"#;
        let frame: InboundFrame = serde_json::from_str(json).unwrap();
        match frame {
            InboundFrame::Typing { data } => {
                assert_eq!(data.user_id, "u1");
                assert_eq!(data.user_name.as_deref(), Some("Ada"));
            }
            other => panic!("expected typing frame, got {other:?}"),
        }
    }

    #[test]
    fn inbound_stop_typing_and_read_frames() {
        let stop: InboundFrame =
            serde_json::from_str(r#"{"type": "stop_typing", "data": {"userId": "u1"}}"#).unwrap();
        assert!(matches!(stop, InboundFrame::StopTyping { .. }));

        let read: InboundFrame =
            serde_json::from_str(r#"{"type": "read", "data": {"messageId": "m1"}}"#).unwrap();
        match read {
            InboundFrame::Read { data } => assert_eq!(data.message_id, "m1"),
            other => panic!("expected read frame, got {other:?}"),
        }
    }

    #[test]
    fn ping_frame_and_pong_reply() {
        let ping: InboundFrame = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(ping, InboundFrame::Ping));

        let pong = serde_json::to_value(Pong::now()).unwrap();
        assert_eq!(pong["type"], "pong");
        assert!(pong["timestamp"].is_string());
    }
}
