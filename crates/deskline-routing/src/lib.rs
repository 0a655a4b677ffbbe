// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing for Deskline: agent selection for queued conversations and
//! high-priority tickets, plus the serialized agent load directory.
//!
//! Selection and commitment are deliberately split: [`RoutingEngine`]
//! decides *which* agent should take an entity, and [`AgentDirectory`]
//! is the only code path that mutates an agent's load counter. The
//! lifecycle managers combine the two.

pub mod directory;
pub mod engine;

pub use directory::AgentDirectory;
pub use engine::RoutingEngine;
