// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `deskline serve` command implementation.
//!
//! Wires the engine together: in-memory storage, connection registry,
//! typing coordinator, event broadcaster, routing engine, lifecycle
//! managers, and the axum gateway. Supports graceful shutdown via signal
//! handlers.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use deskline_config::DesklineConfig;
use deskline_conversation::{ConversationAnalytics, ConversationManager};
use deskline_core::error::DesklineError;
use deskline_core::traits::StorageAdapter;
use deskline_gateway::{AuthConfig, GatewayState, ServerConfig, start_server};
use deskline_realtime::{ConnectionRegistry, EventBroadcaster, TypingCoordinator};
use deskline_routing::{AgentDirectory, RoutingEngine};
use deskline_storage::MemoryStorage;
use deskline_ticket::{SlaPolicy, TicketManager};

/// Initializes the tracing subscriber from the configured log level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("deskline={log_level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal
/// is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::error!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    token_clone.cancel();
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Runs the `deskline serve` command.
pub async fn run_serve(config: DesklineConfig) -> Result<(), DesklineError> {
    init_tracing(&config.service.log_level);
    info!(service = config.service.name.as_str(), "starting deskline serve");

    // Storage.
    let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
    storage.initialize().await?;

    // Realtime services.
    let registry = Arc::new(ConnectionRegistry::new());
    let typing = Arc::new(TypingCoordinator::new(
        Arc::clone(&registry),
        Duration::from_secs(config.typing.expiry_secs),
    ));
    // Outbound email/SMS delivery is an external collaborator; without a
    // configured sender the broadcaster skips notifications.
    let broadcaster = Arc::new(EventBroadcaster::new(Arc::clone(&registry), None));

    // Routing and lifecycle managers.
    let routing = Arc::new(RoutingEngine::new(
        storage.clone() as Arc<dyn StorageAdapter>
    ));
    let directory = Arc::new(AgentDirectory::new(
        storage.clone() as Arc<dyn StorageAdapter>
    ));
    let conversations = Arc::new(ConversationManager::new(
        storage.clone(),
        Arc::clone(&routing),
        Arc::clone(&directory),
        Arc::clone(&broadcaster),
        Arc::clone(&typing),
        config.lifecycle.strict_transitions,
    ));
    let sla = SlaPolicy {
        urgent_hours: config.sla.urgent_hours,
        high_hours: config.sla.high_hours,
        medium_hours: config.sla.medium_hours,
        low_hours: config.sla.low_hours,
    };
    let tickets = Arc::new(TicketManager::new(
        storage.clone(),
        Arc::clone(&routing),
        Arc::clone(&directory),
        Arc::clone(&broadcaster),
        sla,
        config.lifecycle.strict_transitions,
    ));
    let analytics = Arc::new(ConversationAnalytics::new(
        storage.clone() as Arc<dyn StorageAdapter>
    ));

    let state = GatewayState {
        conversations,
        tickets,
        analytics,
        storage: storage.clone(),
        registry: Arc::clone(&registry),
        typing: Arc::clone(&typing),
        auth: AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        },
        connection_buffer: config.server.connection_buffer,
        start_time: std::time::Instant::now(),
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let shutdown = install_signal_handler();
    tokio::select! {
        result = start_server(&server_config, state) => {
            result?;
        }
        _ = shutdown.cancelled() => {
            info!("shutting down");
        }
    }

    // Drop realtime state and flush storage.
    typing.shutdown();
    registry.shutdown();
    storage.close().await?;
    info!("deskline serve stopped");
    Ok(())
}
