//! On-demand replay of pending intents.

use serde::Serialize;
use tracing::info;

use orghub_core::result::AppResult;

use crate::directory::CascadeMode;
use crate::intent::executor::IntentExecutor;
use crate::stores::Stores;

/// Counts from one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Intents picked up.
    pub attempted: usize,
    /// Intents applied and marked complete.
    pub completed: usize,
    /// Intents that failed again and stay pending.
    pub failed: usize,
}

/// Re-applies pending intents, oldest first.
#[derive(Debug, Clone)]
pub struct IntentReplayer {
    stores: Stores,
    executor: IntentExecutor,
}

impl IntentReplayer {
    /// Creates a replayer.
    pub fn new(stores: Stores) -> Self {
        Self {
            executor: IntentExecutor::new(stores.clone()),
            stores,
        }
    }

    /// Replay up to `limit` pending intents once.
    ///
    /// Deletions run in lenient mode so an interrupted cascade resumes
    /// where it stopped. One failing intent does not stop the pass.
    #[tracing::instrument(skip(self))]
    pub async fn replay_pending(&self, limit: u32) -> AppResult<ReplaySummary> {
        let mut tx = self.stores.read().await?;
        let pending = tx.list_pending_intents(limit).await?;
        tx.commit().await?;

        let mut summary = ReplaySummary::default();
        for intent in &pending {
            summary.attempted += 1;
            match self.executor.run(intent, CascadeMode::Lenient).await {
                Ok(_) => summary.completed += 1,
                Err(_) => summary.failed += 1,
            }
        }

        info!(
            attempted = summary.attempted,
            completed = summary.completed,
            failed = summary.failed,
            "Intent replay finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use orghub_core::config::AllocatorConfig;
    use orghub_core::traits::DocumentStore;
    use orghub_database::RelationalStore;
    use orghub_database::memory::MemoryRelationalStore;
    use orghub_docstore::memory::MemoryDocumentStore;
    use orghub_entity::intent::DocumentIntent;

    use super::*;
    use crate::directory::DirectoryTreeStore;

    #[tokio::test]
    async fn test_replay_applies_in_creation_order_and_skips_completed() {
        let relational: Arc<dyn RelationalStore> = Arc::new(MemoryRelationalStore::default());
        let documents: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let stores = Stores::new(relational, documents.clone(), &AllocatorConfig::default());
        let company = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();

        let parent_intent =
            DocumentIntent::create_root_directory(Uuid::new_v4(), root, company, company, None, creator, "Acme");
        let mut child_intent =
            DocumentIntent::create_root_directory(Uuid::new_v4(), child, root, company, None, creator, "Sales");
        child_intent.created_at = parent_intent.created_at + chrono::Duration::seconds(1);

        let mut tx = stores.write().await.unwrap();
        tx.insert_intent(&child_intent).await.unwrap();
        tx.insert_intent(&parent_intent).await.unwrap();
        tx.commit().await.unwrap();

        let replayer = IntentReplayer::new(stores.clone());
        let summary = replayer.replay_pending(10).await.unwrap();
        assert_eq!(
            summary,
            ReplaySummary {
                attempted: 2,
                completed: 2,
                failed: 0,
            }
        );

        let tree = DirectoryTreeStore::new(documents);
        let parent = tree.get_directory(root).await.unwrap();
        assert_eq!(parent.folders.len(), 1);
        assert_eq!(parent.folders[0].id, child);

        let again = replayer.replay_pending(10).await.unwrap();
        assert_eq!(again.attempted, 0);
    }
}
