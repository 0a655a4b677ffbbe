// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use deskline_conversation::{ConversationAnalytics, ConversationManager};
use deskline_core::error::DesklineError;
use deskline_core::traits::StorageAdapter;
use deskline_realtime::{ConnectionRegistry, TypingCoordinator};
use deskline_ticket::TicketManager;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub conversations: Arc<ConversationManager>,
    pub tickets: Arc<TicketManager>,
    pub analytics: Arc<ConversationAnalytics>,
    pub storage: Arc<dyn StorageAdapter>,
    pub registry: Arc<ConnectionRegistry>,
    pub typing: Arc<TypingCoordinator>,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Per-connection outbound buffer size.
    pub connection_buffer: usize,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Gateway server configuration (mirrors ServerConfig from deskline-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Builds the gateway router.
///
/// - Public: `GET /health`
/// - Authenticated under `/v1`: conversation, ticket, agent, and metrics
///   routes
/// - `GET /ws/{conversation_id}`: WebSocket attach (participant identity
///   via query params, not middleware)
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/conversations",
            post(handlers::post_conversation).get(handlers::get_conversations),
        )
        .route(
            "/v1/conversations/{id}/messages",
            post(handlers::post_message).get(handlers::get_messages),
        )
        .route(
            "/v1/conversations/{id}/assign",
            post(handlers::post_conversation_assign),
        )
        .route(
            "/v1/conversations/{id}/transfer",
            post(handlers::post_conversation_transfer),
        )
        .route(
            "/v1/conversations/{id}/status",
            post(handlers::post_conversation_status),
        )
        .route(
            "/v1/conversations/{id}/read",
            post(handlers::post_conversation_read),
        )
        .route("/v1/tickets", post(handlers::post_ticket).get(handlers::get_tickets))
        .route("/v1/tickets/{id}/assign", post(handlers::post_ticket_assign))
        .route("/v1/tickets/{id}/status", post(handlers::post_ticket_status))
        .route(
            "/v1/tickets/{id}/priority",
            post(handlers::post_ticket_priority),
        )
        .route(
            "/v1/tickets/{id}/first-response",
            post(handlers::post_ticket_first_response),
        )
        .route("/v1/agents", post(handlers::post_agent).get(handlers::get_agents))
        .route("/v1/metrics/sla", get(handlers::get_sla_metrics))
        .route(
            "/v1/metrics/conversations",
            get(handlers::get_conversation_overview),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state.clone());

    // WebSocket route (participant identity comes from query params).
    let ws_routes = Router::new()
        .route("/ws/{conversation_id}", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP/WebSocket server.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), DesklineError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| DesklineError::Transport {
                message: format!("failed to bind gateway to {addr}: {e}"),
                source: Some(Box::new(e)),
            })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| DesklineError::Transport {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
