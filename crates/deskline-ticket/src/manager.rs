// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket lifecycle manager.
//!
//! Owns ticket creation, priority and status changes, assignment with
//! auto-routing for high and urgent priorities, first-response tracking,
//! SLA queries, and bulk operations with per-id partial-failure semantics.
//! Notifications are emitted after the domain mutation commits and never
//! affect the operation's outcome.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use deskline_core::error::DesklineError;
use deskline_core::events::ConversationEvent;
use deskline_core::traits::StorageAdapter;
use deskline_core::types::{Agent, Ticket, TicketFilter, TicketPriority, TicketStatus};
use deskline_realtime::EventBroadcaster;
use deskline_routing::{AgentDirectory, RoutingEngine};

use crate::sla::{self, SlaMetrics, SlaPolicy};

/// Input for [`TicketManager::create`].
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub conversation_id: Option<String>,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub subject: String,
    pub description: String,
    /// Defaults to `medium` when unspecified.
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub team: Option<String>,
}

/// Outcome of a bulk operation: per-id successes and failures.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

/// A single failed item within a bulk operation.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub id: String,
    pub error: String,
}

impl BulkOutcome {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Whether `from -> to` is part of the explicit ticket lifecycle.
///
/// `open -> in_progress -> waiting/resolved -> closed`, with waiting
/// tickets able to resume or resolve.
pub fn is_valid_transition(from: TicketStatus, to: TicketStatus) -> bool {
    use TicketStatus::*;
    matches!(
        (from, to),
        (Open, InProgress)
            | (Open, Closed)
            | (InProgress, Waiting)
            | (InProgress, Resolved)
            | (InProgress, Closed)
            | (Waiting, InProgress)
            | (Waiting, Resolved)
            | (Waiting, Closed)
            | (Resolved, Closed)
    )
}

fn check_transition(
    from: TicketStatus,
    to: TicketStatus,
    strict: bool,
) -> Result<(), DesklineError> {
    if from == to || is_valid_transition(from, to) {
        return Ok(());
    }
    if strict {
        return Err(DesklineError::validation(format!(
            "invalid ticket transition: {from} -> {to}"
        )));
    }
    warn!(%from, %to, "out-of-table ticket transition applied");
    Ok(())
}

/// Manages the ticket state machine, SLA deadlines, and their side effects.
pub struct TicketManager {
    storage: Arc<dyn StorageAdapter>,
    routing: Arc<RoutingEngine>,
    directory: Arc<AgentDirectory>,
    broadcaster: Arc<EventBroadcaster>,
    sla: SlaPolicy,
    strict_transitions: bool,
}

impl TicketManager {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        routing: Arc<RoutingEngine>,
        directory: Arc<AgentDirectory>,
        broadcaster: Arc<EventBroadcaster>,
        sla: SlaPolicy,
        strict_transitions: bool,
    ) -> Self {
        Self {
            storage,
            routing,
            directory,
            broadcaster,
            sla,
            strict_transitions,
        }
    }

    /// Creates a ticket in `open` with its SLA deadline stamped.
    ///
    /// Urgent and high priorities immediately run routing; a no-assignment
    /// outcome leaves the ticket open. A "created" notification goes to
    /// the customer, best-effort.
    pub async fn create(&self, new: NewTicket) -> Result<Ticket, DesklineError> {
        if new.customer_id.trim().is_empty() {
            return Err(DesklineError::validation("customer_id must not be empty"));
        }
        if new.subject.trim().is_empty() {
            return Err(DesklineError::validation("subject must not be empty"));
        }

        let now = Utc::now();
        let priority = new.priority.unwrap_or(TicketPriority::Medium);
        let mut ticket = Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: new.conversation_id,
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            agent_id: None,
            team: new.team,
            subject: new.subject,
            description: new.description,
            priority,
            status: TicketStatus::Open,
            category: new.category,
            tags: new.tags,
            sla_due_at: Some(self.sla.due_at(now, priority)),
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.storage.create_ticket(&ticket).await?;
        info!(
            ticket_id = ticket.id.as_str(),
            priority = %priority,
            "ticket created"
        );

        if matches!(priority, TicketPriority::Urgent | TicketPriority::High) {
            match self.try_auto_assign(&mut ticket).await {
                Ok(true) => {}
                Ok(false) => debug!(
                    ticket_id = ticket.id.as_str(),
                    "no agent available, ticket stays open"
                ),
                Err(e) => warn!(
                    ticket_id = ticket.id.as_str(),
                    error = %e,
                    "ticket auto-assignment failed (non-fatal)"
                ),
            }
        }

        self.notify_customer(
            &ticket,
            &format!("Ticket received: {}", ticket.subject),
            &format!(
                "Your ticket {} has been created. We aim to respond by {}.",
                ticket.id,
                ticket
                    .sla_due_at
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default()
            ),
        )
        .await;

        Ok(ticket)
    }

    /// Skill tags used for routing a ticket: its tags plus its category.
    fn routing_tags(ticket: &Ticket) -> Vec<String> {
        let mut tags = ticket.tags.clone();
        if let Some(category) = &ticket.category {
            tags.push(category.clone());
        }
        tags
    }

    async fn try_auto_assign(&self, ticket: &mut Ticket) -> Result<bool, DesklineError> {
        let Some(candidate) = self.routing.select(&Self::routing_tags(ticket)).await? else {
            return Ok(false);
        };
        let agent = match self.directory.reserve(&candidate.id).await {
            Ok(agent) => agent,
            Err(DesklineError::CapacityExceeded { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        self.commit_assignment(ticket, &agent).await?;
        Ok(true)
    }

    /// Explicitly assigns a ticket to an agent, setting `in_progress` and
    /// notifying customer and agent.
    pub async fn assign(&self, ticket_id: &str, agent_id: &str) -> Result<Ticket, DesklineError> {
        let mut ticket = self.storage.get_ticket(ticket_id).await?;
        let agent = self.directory.reserve(agent_id).await?;
        self.commit_assignment(&mut ticket, &agent).await?;
        Ok(ticket)
    }

    /// Applies an assignment whose agent slot is already reserved.
    async fn commit_assignment(
        &self,
        ticket: &mut Ticket,
        agent: &Agent,
    ) -> Result<(), DesklineError> {
        ticket.agent_id = Some(agent.id.clone());
        ticket.status = TicketStatus::InProgress;
        ticket.touch();
        self.storage.update_ticket(ticket).await?;

        if let Some(conversation_id) = &ticket.conversation_id {
            self.broadcaster.broadcast(&ConversationEvent::agent_assigned(
                conversation_id,
                &agent.id,
                &agent.name,
            ));
        }

        self.notify_customer(
            ticket,
            &format!("Ticket assigned: {}", ticket.subject),
            &format!(
                "Your ticket {} is now being handled by {}.",
                ticket.id, agent.name
            ),
        )
        .await;
        if let Some(agent_email) = &agent.email {
            self.broadcaster
                .email_best_effort(
                    agent_email,
                    &format!("Assigned ticket: {}", ticket.subject),
                    &format!(
                        "Ticket {} ({} priority) has been assigned to you.",
                        ticket.id, ticket.priority
                    ),
                    None,
                )
                .await;
        }

        info!(
            ticket_id = ticket.id.as_str(),
            agent_id = agent.id.as_str(),
            "agent assigned to ticket"
        );
        Ok(())
    }

    /// Changes a ticket's priority and recomputes the SLA deadline from
    /// the ticket's original creation time.
    ///
    /// An escalation to urgent/high notifies the customer. The recomputed
    /// deadline may already be in the past, in which case the ticket is
    /// immediately overdue.
    pub async fn update_priority(
        &self,
        ticket_id: &str,
        priority: TicketPriority,
    ) -> Result<Ticket, DesklineError> {
        let mut ticket = self.storage.get_ticket(ticket_id).await?;
        let due_at = self.sla.due_at(ticket.created_at, priority);
        ticket.priority = priority;
        ticket.sla_due_at = Some(due_at);
        ticket.touch();
        self.storage.update_ticket(&ticket).await?;
        info!(
            ticket_id,
            priority = %priority,
            sla_due_at = %due_at,
            "ticket priority updated"
        );

        if matches!(priority, TicketPriority::Urgent | TicketPriority::High) {
            self.notify_customer(
                &ticket,
                &format!("Ticket priority raised: {}", ticket.subject),
                &format!(
                    "Your ticket {} is now {} priority.",
                    ticket.id, ticket.priority
                ),
            )
            .await;
        }
        Ok(ticket)
    }

    /// Records the first agent response time, write-once.
    pub async fn record_first_response(&self, ticket_id: &str) -> Result<Ticket, DesklineError> {
        let mut ticket = self.storage.get_ticket(ticket_id).await?;
        if ticket.first_response_at.is_some() {
            return Err(DesklineError::validation(format!(
                "first response already recorded for ticket {ticket_id}"
            )));
        }
        ticket.first_response_at = Some(Utc::now());
        ticket.touch();
        self.storage.update_ticket(&ticket).await?;
        debug!(ticket_id, "first response recorded");
        Ok(ticket)
    }

    /// Sets the ticket status, stamping `resolved_at`/`closed_at` on entry
    /// and releasing the assigned agent's slot when the ticket leaves the
    /// open states.
    pub async fn update_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
    ) -> Result<Ticket, DesklineError> {
        let mut ticket = self.storage.get_ticket(ticket_id).await?;
        check_transition(ticket.status, status, self.strict_transitions)?;
        if ticket.status == status {
            return Ok(ticket);
        }

        let was_open = matches!(
            ticket.status,
            TicketStatus::Open | TicketStatus::InProgress | TicketStatus::Waiting
        );
        let now = Utc::now();
        match status {
            TicketStatus::Resolved => {
                ticket.resolved_at.get_or_insert(now);
            }
            TicketStatus::Closed => {
                ticket.closed_at.get_or_insert(now);
            }
            _ => {}
        }
        ticket.status = status;
        ticket.touch();
        self.storage.update_ticket(&ticket).await?;

        let leaving_open =
            was_open && matches!(status, TicketStatus::Resolved | TicketStatus::Closed);
        if leaving_open && let Some(agent_id) = ticket.agent_id.clone() {
            if let Err(e) = self.directory.release(&agent_id).await {
                warn!(agent_id = agent_id.as_str(), error = %e, "failed to release agent slot");
            }
        }

        info!(ticket_id, status = %status, "ticket status updated");
        Ok(ticket)
    }

    /// Whether the ticket has breached its SLA.
    pub fn is_overdue(&self, ticket: &Ticket) -> bool {
        sla::is_overdue(ticket, Utc::now())
    }

    /// Time remaining until SLA breach, floored at zero; `None` when not
    /// applicable.
    pub fn time_until_breach(&self, ticket: &Ticket) -> Option<Duration> {
        sla::time_until_breach(ticket, Utc::now())
    }

    /// Aggregate SLA compliance over the tickets matching `filter`.
    pub async fn sla_metrics(&self, filter: &TicketFilter) -> Result<SlaMetrics, DesklineError> {
        let tickets = self.storage.list_tickets(filter).await?;
        Ok(sla::compute_metrics(&tickets))
    }

    /// Applies [`update_status`](Self::update_status) per id, collecting
    /// failures without aborting the batch.
    pub async fn bulk_update_status(
        &self,
        ticket_ids: &[String],
        status: TicketStatus,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in ticket_ids {
            match self.update_status(id, status).await {
                Ok(_) => outcome.succeeded.push(id.clone()),
                Err(e) => outcome.failed.push(BulkFailure {
                    id: id.clone(),
                    error: e.to_string(),
                }),
            }
        }
        info!(
            succeeded = outcome.succeeded_count(),
            failed = outcome.failed_count(),
            "bulk status update finished"
        );
        outcome
    }

    /// Applies [`assign`](Self::assign) per id, collecting failures
    /// without aborting the batch.
    pub async fn bulk_assign(&self, ticket_ids: &[String], agent_id: &str) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in ticket_ids {
            match self.assign(id, agent_id).await {
                Ok(_) => outcome.succeeded.push(id.clone()),
                Err(e) => outcome.failed.push(BulkFailure {
                    id: id.clone(),
                    error: e.to_string(),
                }),
            }
        }
        info!(
            agent_id,
            succeeded = outcome.succeeded_count(),
            failed = outcome.failed_count(),
            "bulk assignment finished"
        );
        outcome
    }

    /// Fetches one ticket.
    pub async fn get(&self, ticket_id: &str) -> Result<Ticket, DesklineError> {
        self.storage.get_ticket(ticket_id).await
    }

    /// Lists tickets through the storage filter.
    pub async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, DesklineError> {
        self.storage.list_tickets(filter).await
    }

    /// Best-effort "to the customer" email.
    async fn notify_customer(&self, ticket: &Ticket, subject: &str, body: &str) {
        let Some(email) = &ticket.customer_email else {
            debug!(
                ticket_id = ticket.id.as_str(),
                "customer has no email, skipping notification"
            );
            return;
        };
        self.broadcaster
            .email_best_effort(email, subject, body, None)
            .await;
    }
}
