// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Deskline conversation routing and ticket-SLA engine.
//!
//! This crate provides the domain entities, realtime event schemas, error
//! types, and port traits used throughout the Deskline workspace. The
//! lifecycle managers, routing engine, and realtime services all build on
//! the definitions here.

pub mod error;
pub mod events;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DesklineError;
pub use events::{ConversationEvent, EventData, EventType, InboundFrame, Pong};
pub use types::{
    Agent, AgentFilter, AgentPresence, Attachment, ContentKind, Conversation,
    ConversationFilter, ConversationStatus, HealthStatus, Message, ParticipantKind,
    SenderKind, Ticket, TicketFilter, TicketPriority, TicketStatus,
};

// Re-export port traits at crate root.
pub use traits::{Notifier, StorageAdapter};
