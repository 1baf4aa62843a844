//! In-memory document store backed by [`DashMap`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::traits::{Collection, DocumentSession, DocumentStore};

type Key = (Collection, Uuid);

/// Document store kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<DashMap<Key, Value>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed documents in `collection`.
    pub fn count(&self, collection: Collection) -> usize {
        self.documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .count()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn begin(&self) -> AppResult<Box<dyn DocumentSession>> {
        Ok(Box::new(MemorySession {
            documents: Arc::clone(&self.documents),
            staged: HashMap::new(),
        }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// A write waiting for commit.
#[derive(Debug, Clone)]
enum Staged {
    Insert(Value),
    Put(Value),
    Delete,
}

struct MemorySession {
    documents: Arc<DashMap<Key, Value>>,
    staged: HashMap<Key, Staged>,
}

impl MemorySession {
    fn current(&self, key: &Key) -> Option<Value> {
        match self.staged.get(key) {
            Some(Staged::Insert(body) | Staged::Put(body)) => Some(body.clone()),
            Some(Staged::Delete) => None,
            None => self.documents.get(key).map(|entry| entry.value().clone()),
        }
    }
}

#[async_trait]
impl DocumentSession for MemorySession {
    async fn find(&mut self, collection: Collection, id: Uuid) -> AppResult<Option<Value>> {
        Ok(self.current(&(collection, id)))
    }

    async fn insert(&mut self, collection: Collection, id: Uuid, body: Value) -> AppResult<()> {
        let key = (collection, id);
        if self.current(&key).is_some() {
            return Err(AppError::conflict(format!(
                "{collection} document {id} already exists"
            )));
        }
        let staged = match self.staged.get(&key) {
            Some(Staged::Delete) => Staged::Put(body),
            _ => Staged::Insert(body),
        };
        self.staged.insert(key, staged);
        Ok(())
    }

    async fn replace(&mut self, collection: Collection, id: Uuid, body: Value) -> AppResult<bool> {
        let key = (collection, id);
        if self.current(&key).is_none() {
            return Ok(false);
        }
        match self.staged.entry(key) {
            Entry::Occupied(mut slot) => {
                let next = match slot.get() {
                    Staged::Insert(_) => Staged::Insert(body),
                    _ => Staged::Put(body),
                };
                slot.insert(next);
            }
            Entry::Vacant(slot) => {
                slot.insert(Staged::Put(body));
            }
        }
        Ok(true)
    }

    async fn delete(&mut self, collection: Collection, id: Uuid) -> AppResult<bool> {
        let key = (collection, id);
        if self.current(&key).is_none() {
            return Ok(false);
        }
        if matches!(self.staged.get(&key), Some(Staged::Insert(_))) {
            self.staged.remove(&key);
        } else {
            self.staged.insert(key, Staged::Delete);
        }
        Ok(true)
    }

    async fn keys(&mut self, collection: Collection) -> AppResult<Vec<Uuid>> {
        let mut keys: Vec<Uuid> = self
            .documents
            .iter()
            .map(|entry| *entry.key())
            .filter(|key| key.0 == collection && !self.staged.contains_key(key))
            .map(|key| key.1)
            .collect();
        keys.extend(
            self.staged
                .iter()
                .filter(|(key, staged)| key.0 == collection && !matches!(staged, Staged::Delete))
                .map(|(key, _)| key.1),
        );
        keys.sort();
        Ok(keys)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemorySession { documents, staged } = *self;

        for (key, write) in &staged {
            if matches!(write, Staged::Insert(_)) && documents.contains_key(key) {
                return Err(AppError::conflict(format!(
                    "{} document {} already exists",
                    key.0, key.1
                )));
            }
        }

        let writes = staged.len();
        for (key, write) in staged {
            match write {
                Staged::Insert(body) | Staged::Put(body) => {
                    documents.insert(key, body);
                }
                Staged::Delete => {
                    documents.remove(&key);
                }
            }
        }
        debug!(writes, "Document session committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orghub_core::error::ErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_writes_are_invisible_until_commit() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();

        let mut session = store.begin().await.unwrap();
        session
            .insert(Collection::Directories, id, json!({ "title": "Root" }))
            .await
            .unwrap();
        assert!(session.find(Collection::Directories, id).await.unwrap().is_some());
        assert_eq!(store.count(Collection::Directories), 0);

        session.commit().await.unwrap();
        assert_eq!(store.count(Collection::Directories), 1);
    }

    #[tokio::test]
    async fn test_dropped_session_discards_writes() {
        let store = MemoryDocumentStore::new();
        {
            let mut session = store.begin().await.unwrap();
            session
                .insert(Collection::Notebooks, Uuid::new_v4(), json!({}))
                .await
                .unwrap();
        }
        assert_eq!(store.count(Collection::Notebooks), 0);
    }

    #[tokio::test]
    async fn test_insert_existing_key_is_conflict() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();
        let mut session = store.begin().await.unwrap();
        session
            .insert(Collection::Permissions, id, json!({}))
            .await
            .unwrap();
        session.commit().await.unwrap();

        let mut session = store.begin().await.unwrap();
        let err = session
            .insert(Collection::Permissions, id, json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_replace_and_delete_report_absent_keys() {
        let store = MemoryDocumentStore::new();
        let mut session = store.begin().await.unwrap();
        let id = Uuid::new_v4();

        assert!(!session.replace(Collection::Directories, id, json!({})).await.unwrap());
        assert!(!session.delete(Collection::Directories, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_reflect_staged_writes() {
        let store = MemoryDocumentStore::new();
        let kept = Uuid::new_v4();
        let dropped = Uuid::new_v4();

        let mut session = store.begin().await.unwrap();
        session.insert(Collection::Notebooks, kept, json!({})).await.unwrap();
        session.insert(Collection::Notebooks, dropped, json!({})).await.unwrap();
        session.commit().await.unwrap();

        let mut session = store.begin().await.unwrap();
        assert!(session.delete(Collection::Notebooks, dropped).await.unwrap());
        let added = Uuid::new_v4();
        session.insert(Collection::Notebooks, added, json!({})).await.unwrap();

        let mut expected = vec![kept, added];
        expected.sort();
        assert_eq!(session.keys(Collection::Notebooks).await.unwrap(), expected);
    }
}
