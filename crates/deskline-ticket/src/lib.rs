// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket lifecycle and SLA tracking for Deskline.
//!
//! [`TicketManager`] owns the ticket state machine, priority-driven SLA
//! deadlines, auto-assignment for high and urgent tickets, and bulk
//! operations. [`sla`] holds the deadline arithmetic and the compliance
//! metrics rollup.

pub mod manager;
pub mod sla;

pub use manager::{BulkFailure, BulkOutcome, NewTicket, TicketManager};
pub use sla::{SlaMetrics, SlaPolicy};
