// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for live conversation connections.
//!
//! A client attaches to one conversation per socket:
//!
//! `GET /ws/{conversation_id}?participantId=...&participantKind=agent`
//!
//! Client -> Server (JSON): `{"type": "typing"|"stop_typing", "data":
//! {"userId", "userName"}}`, `{"type": "read", "data": {"messageId"}}`,
//! `{"type": "ping"}`.
//!
//! Server -> Client (JSON): the outbound event envelope
//! `{"type", "conversationId", "data", "timestamp"}`, plus `{"type":
//! "pong", "timestamp"}` replies.

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use deskline_core::events::{InboundFrame, Pong};
use deskline_core::types::ParticipantKind;

use crate::server::GatewayState;

/// Identity of the attaching participant, from query params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    pub participant_id: String,
    #[serde(default)]
    pub participant_kind: Option<ParticipantKind>,
}

/// WebSocket upgrade handler.
///
/// Rejects unknown conversations before upgrading, then registers the
/// connection and spawns the forwarder task.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<String>,
    Query(query): Query<WsQuery>,
    State(state): State<GatewayState>,
) -> Response {
    if query.participant_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "participantId is required").into_response();
    }
    if state.storage.get_conversation(&conversation_id).await.is_err() {
        return (StatusCode::NOT_FOUND, "unknown conversation").into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, conversation_id, query))
}

/// Handle an individual WebSocket connection.
///
/// Spawns two halves:
/// 1. Sender task: drains the registry's per-connection buffer into the
///    WebSocket sink, preserving submission order
/// 2. Receiver loop: parses inbound frames and dispatches them
async fn handle_socket(
    socket: WebSocket,
    state: GatewayState,
    conversation_id: String,
    query: WsQuery,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let participant_id = query.participant_id.clone();
    let kind = query.participant_kind.unwrap_or(ParticipantKind::Customer);

    let (tx, mut rx) = mpsc::channel::<String>(state.connection_buffer);
    state
        .registry
        .attach(&conversation_id, &participant_id, kind, tx.clone());

    let sender_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = ws_receiver.next().await {
        match message {
            Message::Text(text) => {
                state.registry.touch(&conversation_id, &participant_id);
                let text_str: &str = &text;
                let frame: InboundFrame = match serde_json::from_str(text_str) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(conversation_id, error = %e, "invalid WebSocket frame");
                        continue;
                    }
                };
                handle_frame(&state, &conversation_id, &participant_id, frame, &tx).await;
            }
            Message::Close(_) => break,
            _ => {} // Binary and ping/pong are handled by the transport layer.
        }
    }

    // Cleanup: drop the registration and any dangling typing state.
    state.registry.detach(&conversation_id, &participant_id);
    state.typing.stop_typing(&conversation_id, &participant_id);
    sender_task.abort();
    debug!(conversation_id, participant_id, "WebSocket closed");
}

/// Dispatch one parsed inbound frame.
async fn handle_frame(
    state: &GatewayState,
    conversation_id: &str,
    participant_id: &str,
    frame: InboundFrame,
    tx: &mpsc::Sender<String>,
) {
    match frame {
        InboundFrame::Typing { data } => {
            state
                .typing
                .start_typing(conversation_id, &data.user_id, data.user_name);
        }
        InboundFrame::StopTyping { data } => {
            state.typing.stop_typing(conversation_id, &data.user_id);
        }
        InboundFrame::Read { data } => {
            if let Err(e) = state
                .conversations
                .mark_read(&data.message_id, Some(participant_id))
                .await
            {
                warn!(
                    conversation_id,
                    message_id = data.message_id.as_str(),
                    error = %e,
                    "mark_read from WebSocket failed"
                );
            }
        }
        InboundFrame::Ping => {
            if let Ok(payload) = serde_json::to_string(&Pong::now()) {
                let _ = tx.try_send(payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_query_deserializes_with_kind() {
        let query: WsQuery =
            serde_json::from_str(r#"{"participantId": "agent-1", "participantKind": "agent"}"#)
                .unwrap();
        assert_eq!(query.participant_id, "agent-1");
        assert_eq!(query.participant_kind, Some(ParticipantKind::Agent));
    }

    #[test]
    fn ws_query_kind_defaults_to_absent() {
        let query: WsQuery = serde_json::from_str(r#"{"participantId": "cust-1"}"#).unwrap();
        assert!(query.participant_kind.is_none());
    }
}
