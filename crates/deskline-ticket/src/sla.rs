// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SLA deadline computation and compliance metrics.
//!
//! The deadline window is keyed by priority and always anchored to the
//! ticket's original creation time: a priority change recomputes the
//! deadline from `created_at`, never from the change time, so a late
//! escalation can produce a deadline that is already in the past.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use deskline_core::types::{Ticket, TicketPriority, TicketStatus};

/// Hours until breach per priority.
#[derive(Debug, Clone)]
pub struct SlaPolicy {
    pub urgent_hours: i64,
    pub high_hours: i64,
    pub medium_hours: i64,
    pub low_hours: i64,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            urgent_hours: 1,
            high_hours: 4,
            medium_hours: 24,
            low_hours: 72,
        }
    }
}

impl SlaPolicy {
    /// The SLA window for a priority.
    pub fn window(&self, priority: TicketPriority) -> Duration {
        let hours = match priority {
            TicketPriority::Urgent => self.urgent_hours,
            TicketPriority::High => self.high_hours,
            TicketPriority::Medium => self.medium_hours,
            TicketPriority::Low => self.low_hours,
        };
        Duration::hours(hours)
    }

    /// Deadline for a ticket created at `created_at` with `priority`.
    pub fn due_at(&self, created_at: DateTime<Utc>, priority: TicketPriority) -> DateTime<Utc> {
        created_at + self.window(priority)
    }
}

/// Whether a ticket has breached its SLA as of `now`.
///
/// True iff a deadline exists, the ticket is not resolved or closed, and
/// `now` is past the deadline.
pub fn is_overdue(ticket: &Ticket, now: DateTime<Utc>) -> bool {
    let Some(due) = ticket.sla_due_at else {
        return false;
    };
    if matches!(ticket.status, TicketStatus::Resolved | TicketStatus::Closed) {
        return false;
    }
    now > due
}

/// Time remaining until SLA breach as of `now`, floored at zero.
///
/// `None` when the ticket carries no deadline or is already resolved or
/// closed.
pub fn time_until_breach(ticket: &Ticket, now: DateTime<Utc>) -> Option<Duration> {
    let due = ticket.sla_due_at?;
    if matches!(ticket.status, TicketStatus::Resolved | TicketStatus::Closed) {
        return None;
    }
    Some((due - now).max(Duration::zero()))
}

/// Aggregate SLA compliance over a set of tickets.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaMetrics {
    /// Tickets considered.
    pub total: usize,
    /// Resolved tickets with a deadline.
    pub resolved_with_sla: usize,
    /// Of those, how many resolved on or before the deadline.
    pub resolved_within_sla: usize,
    /// `resolved_within_sla / resolved_with_sla`, absent with no data.
    pub compliance_rate: Option<f64>,
    /// Mean seconds from creation to first response, over tickets that
    /// have one.
    pub mean_time_to_first_response_secs: Option<f64>,
    /// Mean seconds from creation to resolution, over resolved tickets.
    pub mean_time_to_resolution_secs: Option<f64>,
}

/// Compute compliance and latency aggregates over tickets.
pub fn compute_metrics(tickets: &[Ticket]) -> SlaMetrics {
    let mut metrics = SlaMetrics {
        total: tickets.len(),
        ..SlaMetrics::default()
    };

    let mut first_response_total = 0i64;
    let mut first_response_count = 0usize;
    let mut resolution_total = 0i64;
    let mut resolution_count = 0usize;

    for ticket in tickets {
        if let Some(first_response_at) = ticket.first_response_at {
            first_response_total += (first_response_at - ticket.created_at).num_seconds();
            first_response_count += 1;
        }
        if let Some(resolved_at) = ticket.resolved_at {
            resolution_total += (resolved_at - ticket.created_at).num_seconds();
            resolution_count += 1;
            if let Some(due) = ticket.sla_due_at {
                metrics.resolved_with_sla += 1;
                if resolved_at <= due {
                    metrics.resolved_within_sla += 1;
                }
            }
        }
    }

    if metrics.resolved_with_sla > 0 {
        metrics.compliance_rate =
            Some(metrics.resolved_within_sla as f64 / metrics.resolved_with_sla as f64);
    }
    if first_response_count > 0 {
        metrics.mean_time_to_first_response_secs =
            Some(first_response_total as f64 / first_response_count as f64);
    }
    if resolution_count > 0 {
        metrics.mean_time_to_resolution_secs =
            Some(resolution_total as f64 / resolution_count as f64);
    }
    metrics
}
