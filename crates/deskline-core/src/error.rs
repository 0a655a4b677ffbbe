// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Deskline routing and SLA engine.

use thiserror::Error;

/// The primary error type used across all Deskline ports and core operations.
#[derive(Debug, Error)]
pub enum DesklineError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed or missing required input, rejected before any mutation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced conversation, ticket, agent, or message does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Agent is at its concurrent-chat capacity; no mutation was performed.
    #[error("agent {agent_id} is at capacity ({active_chats}/{max_concurrent_chats})")]
    CapacityExceeded {
        agent_id: String,
        active_chats: u32,
        max_concurrent_chats: u32,
    },

    /// Storage port reported a failure. Propagated as-is, never retried here.
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Outbound notification failure. Always caught and logged by the
    /// best-effort sender, never surfaced to lifecycle callers.
    #[error("notification error: {message}")]
    Notification {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Gateway transport errors (bind failure, socket errors).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DesklineError {
    /// Shorthand for a [`DesklineError::NotFound`] with the given entity label.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a [`DesklineError::Storage`] without an underlying source.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`DesklineError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
