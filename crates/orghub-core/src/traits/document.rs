//! Document store traits.
//!
//! The document store holds directory trees, notebooks and their
//! permission records. It has no referential integrity and no transaction
//! that spans more than one logical call: a [`DocumentSession`] groups the
//! writes of a single call and applies them on [`DocumentSession::commit`].

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::result::AppResult;

/// Named collections in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Folder documents.
    Directories,
    /// Notebook documents.
    Notebooks,
    /// Access lists keyed by the protected resource's identifier.
    Permissions,
}

impl Collection {
    /// Every collection, in creation order.
    pub const ALL: [Collection; 3] = [Self::Directories, Self::Notebooks, Self::Permissions];

    /// The collection name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directories => "directories",
            Self::Notebooks => "notebooks",
            Self::Permissions => "permissions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed document stored in one collection under its identifier.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// The collection this document type lives in.
    const COLLECTION: Collection;

    /// The key the document is stored under.
    fn key(&self) -> Uuid;
}

/// A document store backend (PostgreSQL JSONB collections or in-memory).
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug + 'static {
    /// Open a session. Writes become visible when the session commits.
    async fn begin(&self) -> AppResult<Box<dyn DocumentSession>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// A unit of work against the document store spanning a single call.
#[async_trait]
pub trait DocumentSession: Send {
    /// Fetch a raw document by key.
    async fn find(
        &mut self,
        collection: Collection,
        id: Uuid,
    ) -> AppResult<Option<serde_json::Value>>;

    /// Insert a new document. Fails with `Conflict` if the key is taken.
    async fn insert(
        &mut self,
        collection: Collection,
        id: Uuid,
        body: serde_json::Value,
    ) -> AppResult<()>;

    /// Replace an existing document. Returns `false` if the key is absent.
    async fn replace(
        &mut self,
        collection: Collection,
        id: Uuid,
        body: serde_json::Value,
    ) -> AppResult<bool>;

    /// Delete a document. Returns `false` if the key is absent.
    async fn delete(&mut self, collection: Collection, id: Uuid) -> AppResult<bool>;

    /// List every key in a collection.
    async fn keys(&mut self, collection: Collection) -> AppResult<Vec<Uuid>>;

    /// Apply the session's writes.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
