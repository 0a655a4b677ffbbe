// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port trait definitions for external collaborators.
//!
//! All ports use `#[async_trait]` for dynamic dispatch compatibility and
//! are injected as `Arc<dyn ...>` into the services that consume them.

pub mod notify;
pub mod storage;

// Re-export all traits at the traits module level for convenience.
pub use notify::Notifier;
pub use storage::StorageAdapter;
