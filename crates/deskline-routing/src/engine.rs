// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent selection for newly queued conversations and high-priority tickets.
//!
//! Selection runs in two steps that must stay in this order: the
//! least-busy candidate is chosen *without* regard to capacity, and only
//! then is the capacity gate applied. With every agent full this still
//! picks a definite candidate (and then declines), which is observable
//! behavior the tests pin down.

use std::sync::Arc;

use tracing::debug;

use deskline_core::error::DesklineError;
use deskline_core::traits::StorageAdapter;
use deskline_core::types::{Agent, AgentFilter, AgentPresence};

/// Selects at most one agent for an entity carrying optional skill tags.
pub struct RoutingEngine {
    storage: Arc<dyn StorageAdapter>,
}

impl RoutingEngine {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Runs the full selection against currently online agents.
    ///
    /// Returns `Ok(None)` when no agent is online or the selected agent is
    /// at capacity -- a normal outcome, not an error. The entity stays
    /// queued/open in that case.
    pub async fn select(&self, skill_tags: &[String]) -> Result<Option<Agent>, DesklineError> {
        let online = self
            .storage
            .list_agents(&AgentFilter {
                presence: Some(AgentPresence::Online),
                ..AgentFilter::default()
            })
            .await?;

        let selected = pick(&online, skill_tags).cloned();
        match &selected {
            Some(agent) => debug!(
                agent_id = agent.id.as_str(),
                active_chats = agent.active_chats,
                "routing selected agent"
            ),
            None => debug!(
                online = online.len(),
                tags = ?skill_tags,
                "routing made no assignment"
            ),
        }
        Ok(selected)
    }
}

/// Pure candidate selection over an already-fetched agent list.
///
/// 1. No candidates: no assignment.
/// 2. If skill tags are given and at least one candidate's skill set
///    intersects them, restrict selection to that subset; otherwise keep
///    everyone.
/// 3. Select the lowest `active_chats`; ties break by input order, first
///    encountered wins.
/// 4. Capacity is a final gate on the selected agent, not a filter on the
///    candidate set.
pub fn pick<'a>(agents: &'a [Agent], skill_tags: &[String]) -> Option<&'a Agent> {
    if agents.is_empty() {
        return None;
    }

    let skilled: Vec<&Agent> = if skill_tags.is_empty() {
        agents.iter().collect()
    } else {
        let matching: Vec<&Agent> = agents
            .iter()
            .filter(|agent| agent.skills.iter().any(|skill| skill_tags.contains(skill)))
            .collect();
        if matching.is_empty() {
            agents.iter().collect()
        } else {
            matching
        }
    };

    let mut least_busy: Option<&Agent> = None;
    for agent in skilled {
        if least_busy.is_none_or(|best| agent.active_chats < best.active_chats) {
            least_busy = Some(agent);
        }
    }

    let selected = least_busy?;
    if selected.active_chats >= selected.max_concurrent_chats {
        return None;
    }
    Some(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, skills: &[&str], active: u32, max: u32) -> Agent {
        Agent {
            id: id.to_string(),
            name: id.to_string(),
            email: None,
            presence: AgentPresence::Online,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            max_concurrent_chats: max,
            active_chats: active,
            total_chats_handled: 0,
            rating: None,
        }
    }

    #[test]
    fn empty_pool_yields_no_assignment() {
        assert!(pick(&[], &[]).is_none());
    }

    #[test]
    fn least_busy_wins() {
        let agents = vec![
            agent("a", &[], 2, 5),
            agent("b", &[], 0, 5),
            agent("c", &[], 1, 5),
        ];
        assert_eq!(pick(&agents, &[]).unwrap().id, "b");
    }

    #[test]
    fn ties_break_by_input_order() {
        let agents = vec![
            agent("first", &[], 1, 5),
            agent("second", &[], 1, 5),
            agent("third", &[], 1, 5),
        ];
        assert_eq!(pick(&agents, &[]).unwrap().id, "first");
    }

    #[test]
    fn skill_intersection_restricts_candidates() {
        let agents = vec![
            agent("generalist", &[], 0, 5),
            agent("billing-expert", &["billing"], 3, 5),
        ];
        // The generalist is less busy, but the billing expert matches.
        let selected = pick(&agents, &["billing".to_string()]).unwrap();
        assert_eq!(selected.id, "billing-expert");
    }

    #[test]
    fn no_skill_match_falls_back_to_everyone() {
        let agents = vec![
            agent("a", &["sales"], 2, 5),
            agent("b", &["support"], 1, 5),
        ];
        let selected = pick(&agents, &["billing".to_string()]).unwrap();
        assert_eq!(selected.id, "b");
    }

    #[test]
    fn capacity_gates_after_selection_not_before() {
        // The least-busy agent is full; a less-loaded-relative-to-capacity
        // alternative exists but selection has already locked on, so the
        // outcome is no assignment.
        let agents = vec![agent("full", &[], 2, 2), agent("busy", &[], 3, 5)];
        assert!(pick(&agents, &[]).is_none());
    }

    #[test]
    fn single_full_agent_produces_no_assignment() {
        let agents = vec![agent("only", &[], 3, 3)];
        assert!(pick(&agents, &[]).is_none());
    }

    #[test]
    fn skill_match_with_capacity_gate() {
        let agents = vec![
            agent("full-expert", &["billing"], 2, 2),
            agent("free-generalist", &[], 0, 5),
        ];
        // Restriction to the skill subset leaves only the full expert.
        assert!(pick(&agents, &["billing".to_string()]).is_none());
    }
}
