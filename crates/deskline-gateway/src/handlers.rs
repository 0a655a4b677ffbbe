// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Thin adapters from JSON bodies to the lifecycle managers. Error
//! taxonomy maps onto status codes: validation 400, not-found 404,
//! capacity 409, everything else 500.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use deskline_conversation::{NewConversation, NewMessage};
use deskline_core::error::DesklineError;
use deskline_core::types::{
    Agent, AgentFilter, AgentPresence, Attachment, ContentKind, ConversationFilter,
    ConversationStatus, SenderKind, TicketFilter, TicketPriority, TicketStatus,
};
use deskline_ticket::NewTicket;

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Maps a domain error onto an HTTP response.
fn error_response(err: DesklineError) -> Response {
    let status = match &err {
        DesklineError::Validation(_) => StatusCode::BAD_REQUEST,
        DesklineError::NotFound { .. } => StatusCode::NOT_FOUND,
        DesklineError::CapacityExceeded { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn ok_json<T: Serialize>(value: T) -> Response {
    (StatusCode::OK, Json(value)).into_response()
}

fn created_json<T: Serialize>(value: T) -> Response {
    (StatusCode::CREATED, Json(value)).into_response()
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub connections: usize,
}

/// GET /health
///
/// Public liveness endpoint; also reports the storage health check.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let status = match state.storage.health_check().await {
        Ok(deskline_core::types::HealthStatus::Healthy) => "ok".to_string(),
        Ok(deskline_core::types::HealthStatus::Degraded(reason)) => format!("degraded: {reason}"),
        Ok(deskline_core::types::HealthStatus::Unhealthy(reason)) => {
            format!("unhealthy: {reason}")
        }
        Err(e) => format!("unhealthy: {e}"),
    };
    ok_json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        connections: state.registry.len(),
    })
}

/// Request body for POST /v1/conversations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub customer_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub channel: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// POST /v1/conversations
pub async fn post_conversation(
    State(state): State<GatewayState>,
    Json(body): Json<CreateConversationRequest>,
) -> Response {
    let result = state
        .conversations
        .start(NewConversation {
            customer_id: body.customer_id,
            customer_name: body.customer_name,
            customer_email: body.customer_email,
            channel: body.channel,
            subject: body.subject,
            tags: body.tags,
        })
        .await;
    match result {
        Ok(conversation) => created_json(conversation),
        Err(e) => error_response(e),
    }
}

/// Query parameters for GET /v1/conversations.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationListQuery {
    #[serde(default)]
    pub status: Option<ConversationStatus>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    /// When present, runs the substring search over the filtered listing.
    #[serde(default)]
    pub q: Option<String>,
}

impl ConversationListQuery {
    fn filter(&self) -> ConversationFilter {
        ConversationFilter {
            status: self.status,
            agent_id: self.agent_id.clone(),
            customer_id: self.customer_id.clone(),
            channel: self.channel.clone(),
            tag: self.tag.clone(),
            limit: self.limit,
            offset: self.offset,
            ..ConversationFilter::default()
        }
    }
}

/// GET /v1/conversations
pub async fn get_conversations(
    State(state): State<GatewayState>,
    Query(query): Query<ConversationListQuery>,
) -> Response {
    let filter = query.filter();
    let result = match &query.q {
        Some(q) => state.conversations.search(q, Some(&filter)).await,
        None => state.conversations.list(&filter).await,
    };
    match result {
        Ok(conversations) => ok_json(conversations),
        Err(e) => error_response(e),
    }
}

/// Request body for POST /v1/conversations/{id}/messages.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: String,
    pub sender_name: String,
    pub sender_kind: SenderKind,
    #[serde(default)]
    pub content_kind: Option<ContentKind>,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// POST /v1/conversations/{id}/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Path(conversation_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Response {
    let result = state
        .conversations
        .send_message(NewMessage {
            conversation_id,
            sender_id: body.sender_id,
            sender_name: body.sender_name,
            sender_kind: body.sender_kind,
            content_kind: body.content_kind.unwrap_or(ContentKind::Text),
            content: body.content,
            attachments: body.attachments,
        })
        .await;
    match result {
        Ok(message) => created_json(message),
        Err(e) => error_response(e),
    }
}

/// Query parameters for GET /v1/conversations/{id}/messages.
#[derive(Debug, Default, Deserialize)]
pub struct MessageListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /v1/conversations/{id}/messages
pub async fn get_messages(
    State(state): State<GatewayState>,
    Path(conversation_id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Response {
    match state
        .storage
        .list_messages(&conversation_id, query.limit)
        .await
    {
        Ok(messages) => ok_json(messages),
        Err(e) => error_response(e),
    }
}

/// Request body for assignment endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub agent_id: String,
}

/// POST /v1/conversations/{id}/assign
pub async fn post_conversation_assign(
    State(state): State<GatewayState>,
    Path(conversation_id): Path<String>,
    Json(body): Json<AssignRequest>,
) -> Response {
    match state
        .conversations
        .assign(&conversation_id, &body.agent_id)
        .await
    {
        Ok(conversation) => ok_json(conversation),
        Err(e) => error_response(e),
    }
}

/// Request body for POST /v1/conversations/{id}/transfer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_agent_id: String,
    pub to_agent_id: String,
}

/// POST /v1/conversations/{id}/transfer
pub async fn post_conversation_transfer(
    State(state): State<GatewayState>,
    Path(conversation_id): Path<String>,
    Json(body): Json<TransferRequest>,
) -> Response {
    match state
        .conversations
        .transfer(&conversation_id, &body.from_agent_id, &body.to_agent_id)
        .await
    {
        Ok(conversation) => ok_json(conversation),
        Err(e) => error_response(e),
    }
}

/// Request body for POST /v1/conversations/{id}/status.
#[derive(Debug, Deserialize)]
pub struct ConversationStatusRequest {
    pub status: ConversationStatus,
}

/// POST /v1/conversations/{id}/status
pub async fn post_conversation_status(
    State(state): State<GatewayState>,
    Path(conversation_id): Path<String>,
    Json(body): Json<ConversationStatusRequest>,
) -> Response {
    match state
        .conversations
        .update_status(&conversation_id, body.status)
        .await
    {
        Ok(conversation) => ok_json(conversation),
        Err(e) => error_response(e),
    }
}

/// Request body for POST /v1/conversations/{id}/read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    #[serde(default)]
    pub reader_id: Option<String>,
}

/// Response body for POST /v1/conversations/{id}/read.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub marked: usize,
}

/// POST /v1/conversations/{id}/read
pub async fn post_conversation_read(
    State(state): State<GatewayState>,
    Path(conversation_id): Path<String>,
    Json(body): Json<MarkReadRequest>,
) -> Response {
    match state
        .conversations
        .mark_conversation_read(&conversation_id, body.reader_id.as_deref())
        .await
    {
        Ok(marked) => ok_json(MarkReadResponse { marked }),
        Err(e) => error_response(e),
    }
}

/// Request body for POST /v1/tickets.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub customer_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub team: Option<String>,
}

/// POST /v1/tickets
pub async fn post_ticket(
    State(state): State<GatewayState>,
    Json(body): Json<CreateTicketRequest>,
) -> Response {
    let result = state
        .tickets
        .create(NewTicket {
            conversation_id: body.conversation_id,
            customer_id: body.customer_id,
            customer_name: body.customer_name,
            customer_email: body.customer_email,
            subject: body.subject,
            description: body.description,
            priority: body.priority,
            category: body.category,
            tags: body.tags,
            team: body.team,
        })
        .await;
    match result {
        Ok(ticket) => created_json(ticket),
        Err(e) => error_response(e),
    }
}

/// Query parameters for GET /v1/tickets.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListQuery {
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl TicketListQuery {
    fn filter(&self) -> TicketFilter {
        TicketFilter {
            status: self.status,
            priority: self.priority,
            agent_id: self.agent_id.clone(),
            customer_id: self.customer_id.clone(),
            category: self.category.clone(),
            tag: self.tag.clone(),
            limit: self.limit,
            offset: self.offset,
            ..TicketFilter::default()
        }
    }
}

/// GET /v1/tickets
pub async fn get_tickets(
    State(state): State<GatewayState>,
    Query(query): Query<TicketListQuery>,
) -> Response {
    match state.tickets.list(&query.filter()).await {
        Ok(tickets) => ok_json(tickets),
        Err(e) => error_response(e),
    }
}

/// POST /v1/tickets/{id}/assign
pub async fn post_ticket_assign(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
    Json(body): Json<AssignRequest>,
) -> Response {
    match state.tickets.assign(&ticket_id, &body.agent_id).await {
        Ok(ticket) => ok_json(ticket),
        Err(e) => error_response(e),
    }
}

/// Request body for POST /v1/tickets/{id}/status.
#[derive(Debug, Deserialize)]
pub struct TicketStatusRequest {
    pub status: TicketStatus,
}

/// POST /v1/tickets/{id}/status
pub async fn post_ticket_status(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
    Json(body): Json<TicketStatusRequest>,
) -> Response {
    match state.tickets.update_status(&ticket_id, body.status).await {
        Ok(ticket) => ok_json(ticket),
        Err(e) => error_response(e),
    }
}

/// Request body for POST /v1/tickets/{id}/priority.
#[derive(Debug, Deserialize)]
pub struct TicketPriorityRequest {
    pub priority: TicketPriority,
}

/// POST /v1/tickets/{id}/priority
pub async fn post_ticket_priority(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
    Json(body): Json<TicketPriorityRequest>,
) -> Response {
    match state.tickets.update_priority(&ticket_id, body.priority).await {
        Ok(ticket) => ok_json(ticket),
        Err(e) => error_response(e),
    }
}

/// POST /v1/tickets/{id}/first-response
pub async fn post_ticket_first_response(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
) -> Response {
    match state.tickets.record_first_response(&ticket_id).await {
        Ok(ticket) => ok_json(ticket),
        Err(e) => error_response(e),
    }
}

/// Request body for POST /v1/agents.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub presence: Option<AgentPresence>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub max_concurrent_chats: u32,
}

/// POST /v1/agents
pub async fn post_agent(
    State(state): State<GatewayState>,
    Json(body): Json<CreateAgentRequest>,
) -> Response {
    if body.name.trim().is_empty() {
        return error_response(DesklineError::validation("agent name must not be empty"));
    }
    if body.max_concurrent_chats == 0 {
        return error_response(DesklineError::validation(
            "max_concurrent_chats must be at least 1",
        ));
    }
    let agent = Agent {
        id: uuid::Uuid::new_v4().to_string(),
        name: body.name,
        email: body.email,
        presence: body.presence.unwrap_or(AgentPresence::Online),
        skills: body.skills,
        max_concurrent_chats: body.max_concurrent_chats,
        active_chats: 0,
        total_chats_handled: 0,
        rating: None,
    };
    match state.storage.create_agent(&agent).await {
        Ok(()) => created_json(agent),
        Err(e) => error_response(e),
    }
}

/// Query parameters for GET /v1/agents.
#[derive(Debug, Default, Deserialize)]
pub struct AgentListQuery {
    #[serde(default)]
    pub presence: Option<AgentPresence>,
    #[serde(default)]
    pub skill: Option<String>,
}

/// GET /v1/agents
pub async fn get_agents(
    State(state): State<GatewayState>,
    Query(query): Query<AgentListQuery>,
) -> Response {
    match state
        .storage
        .list_agents(&AgentFilter {
            presence: query.presence,
            skill: query.skill,
        })
        .await
    {
        Ok(agents) => ok_json(agents),
        Err(e) => error_response(e),
    }
}

/// GET /v1/metrics/sla
pub async fn get_sla_metrics(
    State(state): State<GatewayState>,
    Query(query): Query<TicketListQuery>,
) -> Response {
    match state.tickets.sla_metrics(&query.filter()).await {
        Ok(metrics) => ok_json(metrics),
        Err(e) => error_response(e),
    }
}

/// GET /v1/metrics/conversations
pub async fn get_conversation_overview(
    State(state): State<GatewayState>,
    Query(query): Query<ConversationListQuery>,
) -> Response {
    match state.analytics.overview(&query.filter()).await {
        Ok(overview) => ok_json(overview),
        Err(e) => error_response(e),
    }
}
