// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized load accounting for agents.
//!
//! Every mutation of an agent's `active_chats` counter goes through this
//! directory, which holds one async mutex per agent id. Concurrent
//! assignment and transfer therefore cannot lose updates, and the counter
//! stays equal to the number of open conversations and tickets assigned to
//! the agent. Releases clamp at zero to tolerate a double release.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use deskline_core::error::DesklineError;
use deskline_core::traits::StorageAdapter;
use deskline_core::types::Agent;

/// The single synchronized accessor for agent load counters.
pub struct AgentDirectory {
    storage: Arc<dyn StorageAdapter>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AgentDirectory {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, agent_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Reserves one slot on the agent: capacity check, load increment,
    /// lifetime total increment, all under the agent's lock.
    ///
    /// Returns the updated agent, [`DesklineError::NotFound`] for a stale
    /// id, or [`DesklineError::CapacityExceeded`] when the agent is full
    /// (in which case nothing was mutated).
    pub async fn reserve(&self, agent_id: &str) -> Result<Agent, DesklineError> {
        let lock = self.lock_for(agent_id);
        let _guard = lock.lock().await;

        let mut agent = self.storage.get_agent(agent_id).await?;
        if !agent.has_capacity() {
            return Err(DesklineError::CapacityExceeded {
                agent_id: agent.id,
                active_chats: agent.active_chats,
                max_concurrent_chats: agent.max_concurrent_chats,
            });
        }
        agent.active_chats += 1;
        agent.total_chats_handled += 1;
        self.storage.update_agent(&agent).await?;
        debug!(
            agent_id,
            active_chats = agent.active_chats,
            "reserved agent slot"
        );
        Ok(agent)
    }

    /// Releases one slot on the agent, clamping the counter at zero.
    pub async fn release(&self, agent_id: &str) -> Result<Agent, DesklineError> {
        let lock = self.lock_for(agent_id);
        let _guard = lock.lock().await;

        let mut agent = self.storage.get_agent(agent_id).await?;
        agent.active_chats = agent.active_chats.saturating_sub(1);
        self.storage.update_agent(&agent).await?;
        debug!(
            agent_id,
            active_chats = agent.active_chats,
            "released agent slot"
        );
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskline_core::types::AgentPresence;
    use deskline_storage::MemoryStorage;

    async fn storage_with_agent(active: u32, max: u32) -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .create_agent(&Agent {
                id: "agent-1".into(),
                name: "Sam".into(),
                email: None,
                presence: AgentPresence::Online,
                skills: vec![],
                max_concurrent_chats: max,
                active_chats: active,
                total_chats_handled: 0,
                rating: None,
            })
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn reserve_increments_load_and_total() {
        let storage = storage_with_agent(0, 2).await;
        let directory = AgentDirectory::new(storage.clone());

        let agent = directory.reserve("agent-1").await.unwrap();
        assert_eq!(agent.active_chats, 1);
        assert_eq!(agent.total_chats_handled, 1);

        let persisted = storage.get_agent("agent-1").await.unwrap();
        assert_eq!(persisted.active_chats, 1);
    }

    #[tokio::test]
    async fn reserve_at_capacity_fails_without_mutation() {
        let storage = storage_with_agent(2, 2).await;
        let directory = AgentDirectory::new(storage.clone());

        let err = directory.reserve("agent-1").await.unwrap_err();
        assert!(matches!(err, DesklineError::CapacityExceeded { .. }));

        let persisted = storage.get_agent("agent-1").await.unwrap();
        assert_eq!(persisted.active_chats, 2);
        assert_eq!(persisted.total_chats_handled, 0);
    }

    #[tokio::test]
    async fn reserve_unknown_agent_is_not_found() {
        let storage = Arc::new(MemoryStorage::new());
        let directory = AgentDirectory::new(storage);
        let err = directory.reserve("ghost").await.unwrap_err();
        assert!(matches!(err, DesklineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn release_clamps_at_zero() {
        let storage = storage_with_agent(0, 2).await;
        let directory = AgentDirectory::new(storage.clone());

        let agent = directory.release("agent-1").await.unwrap();
        assert_eq!(agent.active_chats, 0);
    }

    #[tokio::test]
    async fn concurrent_reserves_do_not_lose_updates() {
        let storage = storage_with_agent(0, 64).await;
        let directory = Arc::new(AgentDirectory::new(storage.clone()));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let directory = Arc::clone(&directory);
            handles.push(tokio::spawn(
                async move { directory.reserve("agent-1").await },
            ));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let agent = storage.get_agent("agent-1").await.unwrap();
        assert_eq!(agent.active_chats, 32);
        assert_eq!(agent.total_chats_handled, 32);
    }

    #[tokio::test]
    async fn reserve_up_to_capacity_then_rejects() {
        let storage = storage_with_agent(0, 3).await;
        let directory = AgentDirectory::new(storage);

        for _ in 0..3 {
            directory.reserve("agent-1").await.unwrap();
        }
        let err = directory.reserve("agent-1").await.unwrap_err();
        assert!(matches!(
            err,
            DesklineError::CapacityExceeded {
                active_chats: 3,
                max_concurrent_chats: 3,
                ..
            }
        ));
    }
}
