// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin read-side rollup over conversations.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use deskline_core::error::DesklineError;
use deskline_core::traits::StorageAdapter;
use deskline_core::types::{ConversationFilter, ConversationStatus};

/// Conversation counts by status and channel.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationOverview {
    pub total: usize,
    pub queued: usize,
    pub active: usize,
    pub resolved: usize,
    pub closed: usize,
    pub by_channel: BTreeMap<String, usize>,
}

/// Read-side aggregation over the storage port.
pub struct ConversationAnalytics {
    storage: Arc<dyn StorageAdapter>,
}

impl ConversationAnalytics {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Rolls up counts over the conversations matching `filter`.
    pub async fn overview(
        &self,
        filter: &ConversationFilter,
    ) -> Result<ConversationOverview, DesklineError> {
        let conversations = self.storage.list_conversations(filter).await?;
        let mut overview = ConversationOverview {
            total: conversations.len(),
            ..ConversationOverview::default()
        };
        for conversation in &conversations {
            match conversation.status {
                ConversationStatus::Queued => overview.queued += 1,
                ConversationStatus::Active => overview.active += 1,
                ConversationStatus::Resolved => overview.resolved += 1,
                ConversationStatus::Closed => overview.closed += 1,
            }
            *overview
                .by_channel
                .entry(conversation.channel.clone())
                .or_insert(0) += 1;
        }
        Ok(overview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deskline_core::types::Conversation;
    use deskline_storage::MemoryStorage;

    fn conversation(id: &str, status: ConversationStatus, channel: &str) -> Conversation {
        let now = Utc::now();
        Conversation {
            id: id.to_string(),
            customer_id: "cust-1".into(),
            customer_name: "Ada".into(),
            customer_email: None,
            agent_id: None,
            agent_name: None,
            status,
            channel: channel.to_string(),
            subject: None,
            tags: vec![],
            started_at: now,
            assigned_at: None,
            resolved_at: None,
            closed_at: None,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn overview_counts_by_status_and_channel() {
        let storage = Arc::new(MemoryStorage::new());
        for (id, status, channel) in [
            ("c1", ConversationStatus::Queued, "web"),
            ("c2", ConversationStatus::Active, "web"),
            ("c3", ConversationStatus::Active, "email"),
            ("c4", ConversationStatus::Closed, "sms"),
        ] {
            storage
                .create_conversation(&conversation(id, status, channel))
                .await
                .unwrap();
        }

        let analytics = ConversationAnalytics::new(storage);
        let overview = analytics
            .overview(&ConversationFilter::default())
            .await
            .unwrap();

        assert_eq!(overview.total, 4);
        assert_eq!(overview.queued, 1);
        assert_eq!(overview.active, 2);
        assert_eq!(overview.resolved, 0);
        assert_eq!(overview.closed, 1);
        assert_eq!(overview.by_channel["web"], 2);
        assert_eq!(overview.by_channel["email"], 1);
    }

    #[tokio::test]
    async fn overview_respects_the_filter() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .create_conversation(&conversation("c1", ConversationStatus::Active, "web"))
            .await
            .unwrap();
        storage
            .create_conversation(&conversation("c2", ConversationStatus::Active, "email"))
            .await
            .unwrap();

        let analytics = ConversationAnalytics::new(storage);
        let overview = analytics
            .overview(&ConversationFilter {
                channel: Some("web".into()),
                ..ConversationFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(overview.total, 1);
        assert!(!overview.by_channel.contains_key("email"));
    }
}
