// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime services for Deskline: the connection registry, the typing
//! coordinator, and the event broadcaster.
//!
//! All three are explicitly constructed, dependency-injected services with
//! a `shutdown` lifecycle so tests can run isolated instances and so the
//! in-process fan-out can later be swapped for a shared pub/sub backend
//! without touching call sites.

pub mod broadcast;
pub mod registry;
pub mod typing;

pub use broadcast::EventBroadcaster;
pub use registry::ConnectionRegistry;
pub use typing::{DEFAULT_TYPING_EXPIRY, TypingCoordinator};
