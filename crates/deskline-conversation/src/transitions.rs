// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation status transition table.
//!
//! The source system lets `updateConversationStatus` set any of the four
//! statuses directly. That permissiveness is kept as the default; the
//! `strict_transitions` flag enforces the table below instead of guessing
//! at callers' intent.

use tracing::warn;

use deskline_core::error::DesklineError;
use deskline_core::types::ConversationStatus;

/// Whether `from -> to` is part of the explicit lifecycle.
///
/// `queued -> active -> resolved -> closed`, plus the direct
/// `queued -> closed` and `active -> closed` shortcuts.
pub fn is_valid_transition(from: ConversationStatus, to: ConversationStatus) -> bool {
    use ConversationStatus::*;
    matches!(
        (from, to),
        (Queued, Active) | (Queued, Closed) | (Active, Resolved) | (Active, Closed)
            | (Resolved, Closed)
    )
}

/// Validates a transition under the configured strictness.
///
/// Same-status updates are always allowed (idempotent). Out-of-table
/// transitions error when `strict` is set and are applied with a warning
/// otherwise.
pub fn check_transition(
    from: ConversationStatus,
    to: ConversationStatus,
    strict: bool,
) -> Result<(), DesklineError> {
    if from == to || is_valid_transition(from, to) {
        return Ok(());
    }
    if strict {
        return Err(DesklineError::validation(format!(
            "invalid conversation transition: {from} -> {to}"
        )));
    }
    warn!(%from, %to, "out-of-table conversation transition applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConversationStatus::*;

    #[test]
    fn forward_path_is_valid() {
        assert!(is_valid_transition(Queued, Active));
        assert!(is_valid_transition(Active, Resolved));
        assert!(is_valid_transition(Resolved, Closed));
    }

    #[test]
    fn direct_close_shortcuts_are_valid() {
        assert!(is_valid_transition(Queued, Closed));
        assert!(is_valid_transition(Active, Closed));
    }

    #[test]
    fn backward_edges_are_not_in_the_table() {
        assert!(!is_valid_transition(Closed, Active));
        assert!(!is_valid_transition(Resolved, Active));
        assert!(!is_valid_transition(Active, Queued));
        assert!(!is_valid_transition(Queued, Resolved));
    }

    #[test]
    fn permissive_mode_allows_anything() {
        assert!(check_transition(Closed, Queued, false).is_ok());
        assert!(check_transition(Queued, Resolved, false).is_ok());
    }

    #[test]
    fn strict_mode_rejects_out_of_table() {
        let err = check_transition(Closed, Active, true).unwrap_err();
        assert!(matches!(err, DesklineError::Validation(_)));
        assert!(check_transition(Active, Resolved, true).is_ok());
    }

    #[test]
    fn same_status_is_always_ok() {
        assert!(check_transition(Closed, Closed, true).is_ok());
    }
}
