//! Typed access to a [`DocumentSession`].

use async_trait::async_trait;
use uuid::Uuid;

use orghub_core::result::AppResult;
use orghub_core::traits::{Document, DocumentSession};

/// Load and store [`Document`] types through a raw session.
#[async_trait]
pub trait TypedSession {
    /// Fetch and decode a document.
    async fn get<D: Document>(&mut self, id: Uuid) -> AppResult<Option<D>>;

    /// Insert a new document under its key.
    async fn create<D: Document>(&mut self, doc: &D) -> AppResult<()>;

    /// Overwrite an existing document. Returns `false` if it is absent.
    async fn save<D: Document>(&mut self, doc: &D) -> AppResult<bool>;

    /// Delete a document of type `D`. Returns `false` if it is absent.
    async fn remove<D: Document>(&mut self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
impl<S> TypedSession for S
where
    S: DocumentSession + ?Sized,
{
    async fn get<D: Document>(&mut self, id: Uuid) -> AppResult<Option<D>> {
        match self.find(D::COLLECTION, id).await? {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }

    async fn create<D: Document>(&mut self, doc: &D) -> AppResult<()> {
        let body = serde_json::to_value(doc)?;
        self.insert(D::COLLECTION, doc.key(), body).await
    }

    async fn save<D: Document>(&mut self, doc: &D) -> AppResult<bool> {
        let body = serde_json::to_value(doc)?;
        self.replace(D::COLLECTION, doc.key(), body).await
    }

    async fn remove<D: Document>(&mut self, id: Uuid) -> AppResult<bool> {
        self.delete(D::COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orghub_core::traits::{Collection, DocumentStore};
    use orghub_entity::directory::{Directory, NewDirectory};

    use crate::memory::MemoryDocumentStore;

    fn folder() -> Directory {
        let company = Uuid::new_v4();
        Directory::from_new(
            Uuid::new_v4(),
            NewDirectory {
                title: "Company".to_string(),
                description: String::new(),
                parent: company,
                company_id: company,
                division_id: None,
            },
            Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn test_typed_documents_land_in_their_collection() {
        let store = MemoryDocumentStore::new();
        let dir = folder();

        let mut session = store.begin().await.unwrap();
        session.create(&dir).await.unwrap();
        session.commit().await.unwrap();

        assert_eq!(store.count(Collection::Directories), 1);
        assert_eq!(store.count(Collection::Notebooks), 0);

        let mut session = store.begin().await.unwrap();
        let loaded: Option<Directory> = session.get(dir.id).await.unwrap();
        assert_eq!(loaded, Some(dir));
    }

    #[tokio::test]
    async fn test_save_requires_existing_document() {
        let store = MemoryDocumentStore::new();
        let mut session = store.begin().await.unwrap();
        assert!(!session.save(&folder()).await.unwrap());
    }
}
