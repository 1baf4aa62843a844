//! Applies one document intent and settles its relational record.

use tracing::{debug, info, warn};
use uuid::Uuid;

use orghub_core::error::ErrorKind;
use orghub_core::result::AppResult;
use orghub_entity::directory::{Directory, NewDirectory};
use orghub_entity::intent::{DocumentIntent, IntentKind};

use crate::directory::{CascadeDeleter, CascadeMode, CascadeReport, DirectoryTreeStore};
use crate::stores::Stores;

/// Title given to a root folder whose intent carries none.
const UNTITLED: &str = "Untitled";

/// What applying an intent did.
#[derive(Debug, Clone, PartialEq)]
pub enum IntentOutcome {
    /// The root folder was created.
    Created(Directory),
    /// The subtree was removed.
    Deleted(CascadeReport),
    /// The document store already reflected the intent.
    AlreadyApplied,
}

/// Runs intents against the document store.
#[derive(Debug, Clone)]
pub struct IntentExecutor {
    stores: Stores,
    tree: DirectoryTreeStore,
    cascade: CascadeDeleter,
}

impl IntentExecutor {
    /// Creates an executor.
    pub fn new(stores: Stores) -> Self {
        Self {
            tree: DirectoryTreeStore::new(stores.documents.clone()),
            cascade: CascadeDeleter::new(stores.documents.clone()),
            stores,
        }
    }

    /// Apply an intent to the document store without touching its record.
    pub async fn apply(&self, intent: &DocumentIntent, mode: CascadeMode) -> AppResult<IntentOutcome> {
        match intent.kind {
            IntentKind::CreateRootDirectory => self.create_root(intent).await,
            IntentKind::DeleteDirectory => self.delete_tree(intent, mode).await,
        }
    }

    async fn create_root(&self, intent: &DocumentIntent) -> AppResult<IntentOutcome> {
        if self.tree.directory_exists(intent.target_id).await? {
            return Ok(IntentOutcome::AlreadyApplied);
        }
        let new = NewDirectory {
            title: intent.title.clone().unwrap_or_else(|| UNTITLED.to_string()),
            description: String::new(),
            parent: intent.parent_id.unwrap_or(intent.company_id),
            company_id: intent.company_id,
            division_id: intent.division_id,
        };
        let directory = self
            .tree
            .create_directory(intent.target_id, new, intent.created_by)
            .await?;
        Ok(IntentOutcome::Created(directory))
    }

    async fn delete_tree(&self, intent: &DocumentIntent, mode: CascadeMode) -> AppResult<IntentOutcome> {
        let report = match self.cascade.delete_tree(intent.target_id, mode).await {
            Ok(report) => Some(report),
            Err(e) if mode == CascadeMode::Lenient && e.kind == ErrorKind::NotFound => {
                debug!(intent_id = %intent.id, target_id = %intent.target_id, "Folder already gone");
                None
            }
            Err(e) => return Err(e),
        };
        if let Some(parent_id) = intent.parent_id {
            self.tree.detach(parent_id, intent.target_id).await?;
        }
        Ok(report.map_or(IntentOutcome::AlreadyApplied, IntentOutcome::Deleted))
    }

    /// Record the result of an attempt in a short transaction of its own.
    pub async fn settle<T>(&self, intent_id: Uuid, result: &AppResult<T>) -> AppResult<()> {
        let mut tx = self.stores.write().await?;
        match result {
            Ok(_) => {
                tx.complete_intent(intent_id).await?;
            }
            Err(e) => {
                tx.record_intent_failure(intent_id, &e.to_string()).await?;
            }
        }
        tx.commit().await
    }

    /// Apply an intent and settle it. Returns the outcome of the apply step.
    ///
    /// A failure to settle is logged; the intent then stays pending and a
    /// later replay finds it already applied.
    #[tracing::instrument(skip(self, intent), fields(intent_id = %intent.id, kind = ?intent.kind))]
    pub async fn run(&self, intent: &DocumentIntent, mode: CascadeMode) -> AppResult<IntentOutcome> {
        let result = self.apply(intent, mode).await;
        match &result {
            Ok(_) => info!(target_id = %intent.target_id, "Intent applied"),
            Err(e) => warn!(target_id = %intent.target_id, error = %e, "Intent failed"),
        }
        if let Err(e) = self.settle(intent.id, &result).await {
            warn!(error = %e, "Could not settle intent");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use orghub_core::config::AllocatorConfig;
    use orghub_core::traits::DocumentStore;
    use orghub_database::RelationalStore;
    use orghub_database::memory::MemoryRelationalStore;
    use orghub_docstore::memory::MemoryDocumentStore;
    use orghub_entity::intent::IntentStatus;

    use super::*;

    fn stores() -> Stores {
        let relational: Arc<dyn RelationalStore> = Arc::new(MemoryRelationalStore::default());
        let documents: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        Stores::new(relational, documents, &AllocatorConfig::default())
    }

    async fn record(stores: &Stores, intent: &DocumentIntent) {
        let mut tx = stores.write().await.unwrap();
        tx.insert_intent(intent).await.unwrap();
        tx.commit().await.unwrap();
    }

    async fn reload(stores: &Stores, id: Uuid) -> DocumentIntent {
        let mut tx = stores.read().await.unwrap();
        tx.find_intent(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_create_root_is_idempotent() {
        let stores = stores();
        let executor = IntentExecutor::new(stores.clone());
        let company = Uuid::new_v4();
        let intent = DocumentIntent::create_root_directory(
            Uuid::new_v4(),
            Uuid::new_v4(),
            company,
            company,
            None,
            Uuid::new_v4(),
            "Acme",
        );
        record(&stores, &intent).await;

        let first = executor.run(&intent, CascadeMode::Strict).await.unwrap();
        assert!(matches!(first, IntentOutcome::Created(ref d) if d.title == "Acme"));
        assert_eq!(reload(&stores, intent.id).await.status, IntentStatus::Completed);

        let second = executor.apply(&intent, CascadeMode::Lenient).await.unwrap();
        assert_eq!(second, IntentOutcome::AlreadyApplied);
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_intent_stays_pending() {
        let stores = stores();
        let executor = IntentExecutor::new(stores.clone());
        let company = Uuid::new_v4();
        // Parent folder that does not exist.
        let intent = DocumentIntent::create_root_directory(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            company,
            None,
            Uuid::new_v4(),
            "Orphan",
        );
        record(&stores, &intent).await;

        let err = executor.run(&intent, CascadeMode::Strict).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let stored = reload(&stores, intent.id).await;
        assert!(stored.is_pending());
        assert_eq!(stored.attempts, 1);
        assert!(stored.last_error.is_some());
    }

    #[tokio::test]
    async fn test_lenient_delete_of_missing_root_counts_as_applied() {
        let stores = stores();
        let executor = IntentExecutor::new(stores.clone());
        let intent = DocumentIntent::delete_directory(
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
        );

        let strict = executor.apply(&intent, CascadeMode::Strict).await.unwrap_err();
        assert_eq!(strict.kind, ErrorKind::NotFound);
        let lenient = executor.apply(&intent, CascadeMode::Lenient).await.unwrap();
        assert_eq!(lenient, IntentOutcome::AlreadyApplied);
    }
}
