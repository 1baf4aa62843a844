//! Directory tree store: folders, notebooks and their permission records.
//!
//! Each operation runs in one document-store session. A folder or notebook
//! is always written together with its permission record and with the stub
//! its parent folder keeps for it, so the parent never lists a child whose
//! record does not exist.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::traits::{DocumentSession, DocumentStore};
use orghub_docstore::TypedSession;
use orghub_entity::directory::{Directory, DirectoryPatch, NewDirectory};
use orghub_entity::notebook::{Comment, NewNotebook, Notebook, NotebookPatch};
use orghub_entity::permission::{Permission, PermissionScope};

/// Message for a missing folder.
pub const DIRECTORY_NOT_FOUND: &str = "directory not found";
/// Message for a missing notebook.
pub const NOTEBOOK_NOT_FOUND: &str = "notebook not found";
/// Message for a missing permission record.
pub const PERMISSION_NOT_FOUND: &str = "permission record not found";

/// Document-store operations on the directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryTreeStore {
    documents: Arc<dyn DocumentStore>,
}

impl DirectoryTreeStore {
    /// Creates a tree store over `documents`.
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Create a folder with its permission record and attach it to its parent.
    ///
    /// A parent equal to the company identifier makes this a company-level
    /// root folder with no parent document to update.
    pub async fn create_directory(
        &self,
        id: Uuid,
        new: NewDirectory,
        created_by: Uuid,
    ) -> AppResult<Directory> {
        let directory = Directory::from_new(id, new, created_by);
        let mut session = self.documents.begin().await?;

        if !directory.is_company_root() {
            let mut parent = require_parent(session.as_mut(), directory.parent).await?;
            parent.upsert_folder(directory.stub());
            parent.updated_at = Utc::now();
            session.save(&parent).await?;
        }

        session.create(&directory).await?;
        session
            .create(&Permission::for_creator(id, PermissionScope::Directory, created_by))
            .await?;
        session.commit().await?;

        debug!(directory_id = %id, parent = %directory.parent, "Directory created");
        Ok(directory)
    }

    /// Fetch a folder.
    pub async fn get_directory(&self, id: Uuid) -> AppResult<Directory> {
        let mut session = self.documents.begin().await?;
        require_directory(session.as_mut(), id).await
    }

    /// Check if a folder exists.
    pub async fn directory_exists(&self, id: Uuid) -> AppResult<bool> {
        let mut session = self.documents.begin().await?;
        Ok(session.get::<Directory>(id).await?.is_some())
    }

    /// Update a folder's title and description, keeping the parent's stub in step.
    pub async fn update_directory(&self, id: Uuid, patch: DirectoryPatch) -> AppResult<Directory> {
        let mut session = self.documents.begin().await?;
        let mut directory = require_directory(session.as_mut(), id).await?;

        if let Some(title) = patch.title {
            directory.title = title;
        }
        if let Some(description) = patch.description {
            directory.description = description;
        }
        directory.updated_at = Utc::now();
        session.save(&directory).await?;

        refresh_parent_stub(session.as_mut(), directory.parent, |parent| {
            parent.upsert_folder(directory.stub())
        })
        .await?;

        session.commit().await?;
        Ok(directory)
    }

    /// Move a folder under `new_parent`, optionally renaming it.
    pub async fn relocate_directory(
        &self,
        id: Uuid,
        new_parent: Uuid,
        title: Option<String>,
    ) -> AppResult<Directory> {
        let mut session = self.documents.begin().await?;
        let mut directory = require_directory(session.as_mut(), id).await?;
        let old_parent = directory.parent;

        if let Some(title) = title {
            directory.title = title;
        }
        directory.parent = new_parent;
        directory.updated_at = Utc::now();

        if old_parent != new_parent {
            refresh_parent_stub(session.as_mut(), old_parent, |parent| {
                parent.remove_child(id);
            })
            .await?;
        }
        if !directory.is_company_root() {
            let mut parent = require_parent(session.as_mut(), new_parent).await?;
            parent.upsert_folder(directory.stub());
            parent.updated_at = Utc::now();
            session.save(&parent).await?;
        }

        session.save(&directory).await?;
        session.commit().await?;
        debug!(directory_id = %id, from = %old_parent, to = %new_parent, "Directory relocated");
        Ok(directory)
    }

    /// Remove the stub `parent_id` keeps for `child_id`.
    ///
    /// Returns `false` when the parent is not a folder (a company root
    /// identifier or an already-deleted folder) or holds no such stub.
    pub async fn detach(&self, parent_id: Uuid, child_id: Uuid) -> AppResult<bool> {
        let mut session = self.documents.begin().await?;
        let Some(mut parent) = session.get::<Directory>(parent_id).await? else {
            return Ok(false);
        };
        if !parent.remove_child(child_id) {
            return Ok(false);
        }
        parent.updated_at = Utc::now();
        session.save(&parent).await?;
        session.commit().await?;
        Ok(true)
    }

    /// Create a notebook with its permission record and list it in its folder.
    pub async fn create_notebook(
        &self,
        id: Uuid,
        new: NewNotebook,
        created_by: Uuid,
    ) -> AppResult<Notebook> {
        let notebook = Notebook::from_new(id, new, created_by);
        let mut session = self.documents.begin().await?;

        let mut parent = require_parent(session.as_mut(), notebook.parent).await?;
        parent.upsert_file(notebook.stub());
        parent.updated_at = Utc::now();
        session.save(&parent).await?;

        session.create(&notebook).await?;
        session
            .create(&Permission::for_creator(id, PermissionScope::Notebook, created_by))
            .await?;
        session.commit().await?;

        debug!(notebook_id = %id, parent = %notebook.parent, "Notebook created");
        Ok(notebook)
    }

    /// Fetch a notebook.
    pub async fn get_notebook(&self, id: Uuid) -> AppResult<Notebook> {
        let mut session = self.documents.begin().await?;
        require_notebook(session.as_mut(), id).await
    }

    /// Update a notebook's metadata or content.
    pub async fn update_notebook(&self, id: Uuid, patch: NotebookPatch) -> AppResult<Notebook> {
        let mut session = self.documents.begin().await?;
        let mut notebook = require_notebook(session.as_mut(), id).await?;

        let stub_changed = patch.title.is_some() || patch.description.is_some();
        if let Some(title) = patch.title {
            notebook.title = title;
        }
        if let Some(description) = patch.description {
            notebook.description = description;
        }
        if let Some(blocks) = patch.blocks {
            notebook.replace_blocks(blocks);
        }
        notebook.updated_at = Utc::now();
        session.save(&notebook).await?;

        if stub_changed {
            refresh_parent_stub(session.as_mut(), notebook.parent, |parent| {
                parent.upsert_file(notebook.stub())
            })
            .await?;
        }

        session.commit().await?;
        Ok(notebook)
    }

    /// Attach a comment to a notebook block or reply to an existing comment.
    pub async fn add_comment(
        &self,
        notebook_id: Uuid,
        block_id: Uuid,
        reply_to: Option<Uuid>,
        comment: Comment,
    ) -> AppResult<Comment> {
        let mut session = self.documents.begin().await?;
        let mut notebook = require_notebook(session.as_mut(), notebook_id).await?;

        if !notebook.add_comment(block_id, reply_to, comment.clone()) {
            return Err(match reply_to {
                Some(_) => AppError::not_found("comment not found"),
                None => AppError::not_found("block not found"),
            });
        }
        notebook.updated_at = Utc::now();
        session.save(&notebook).await?;
        session.commit().await?;
        Ok(comment)
    }

    /// Delete a notebook, its permission record and its parent's stub.
    pub async fn delete_notebook(&self, id: Uuid) -> AppResult<Notebook> {
        let mut session = self.documents.begin().await?;
        let notebook = require_notebook(session.as_mut(), id).await?;

        session.remove::<Notebook>(id).await?;
        if !session.remove::<Permission>(id).await? {
            warn!(notebook_id = %id, "Notebook had no permission record");
        }
        refresh_parent_stub(session.as_mut(), notebook.parent, |parent| {
            parent.remove_child(id);
        })
        .await?;

        session.commit().await?;
        debug!(notebook_id = %id, "Notebook deleted");
        Ok(notebook)
    }

    /// Fetch the permission record of a resource.
    pub async fn get_permission(&self, resource_id: Uuid) -> AppResult<Permission> {
        let mut session = self.documents.begin().await?;
        session
            .get::<Permission>(resource_id)
            .await?
            .ok_or_else(|| AppError::not_found(PERMISSION_NOT_FOUND))
    }

    /// Overwrite a permission record.
    pub async fn save_permission(&self, permission: &Permission) -> AppResult<()> {
        let mut session = self.documents.begin().await?;
        if !session.save(permission).await? {
            return Err(AppError::not_found(PERMISSION_NOT_FOUND));
        }
        session.commit().await
    }
}

pub(crate) async fn require_directory(
    session: &mut dyn DocumentSession,
    id: Uuid,
) -> AppResult<Directory> {
    session
        .get::<Directory>(id)
        .await?
        .ok_or_else(|| AppError::not_found(DIRECTORY_NOT_FOUND))
}

async fn require_parent(session: &mut dyn DocumentSession, id: Uuid) -> AppResult<Directory> {
    session
        .get::<Directory>(id)
        .await?
        .ok_or_else(|| AppError::not_found("parent directory not found"))
}

async fn require_notebook(session: &mut dyn DocumentSession, id: Uuid) -> AppResult<Notebook> {
    session
        .get::<Notebook>(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOTEBOOK_NOT_FOUND))
}

/// Apply `edit` to the parent folder if it is a folder that still exists.
async fn refresh_parent_stub<F>(
    session: &mut dyn DocumentSession,
    parent_id: Uuid,
    edit: F,
) -> AppResult<()>
where
    F: FnOnce(&mut Directory) + Send,
{
    let Some(mut parent) = session.get::<Directory>(parent_id).await? else {
        return Ok(());
    };
    edit(&mut parent);
    parent.updated_at = Utc::now();
    session.save(&parent).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use orghub_core::error::ErrorKind;
    use orghub_core::traits::Collection;
    use orghub_docstore::memory::MemoryDocumentStore;

    use super::*;

    fn tree() -> (DirectoryTreeStore, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        (DirectoryTreeStore::new(Arc::new(store.clone())), store)
    }

    fn folder(title: &str, parent: Uuid, company_id: Uuid) -> NewDirectory {
        NewDirectory {
            title: title.to_string(),
            description: String::new(),
            parent,
            company_id,
            division_id: None,
        }
    }

    #[tokio::test]
    async fn test_child_folder_is_listed_in_parent() {
        let (tree, _) = tree();
        let company = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let root = tree
            .create_directory(Uuid::new_v4(), folder("Acme", company, company), creator)
            .await
            .unwrap();
        let child = tree
            .create_directory(Uuid::new_v4(), folder("Sales", root.id, company), creator)
            .await
            .unwrap();

        let root = tree.get_directory(root.id).await.unwrap();
        assert_eq!(root.folders, vec![child.stub()]);

        let permission = tree.get_permission(child.id).await.unwrap();
        assert_eq!(permission.full_access, vec![creator]);
        assert!(permission.comment_only.is_empty() && permission.read_only.is_empty());
    }

    #[tokio::test]
    async fn test_missing_parent_writes_nothing() {
        let (tree, store) = tree();
        let company = Uuid::new_v4();
        let err = tree
            .create_directory(
                Uuid::new_v4(),
                folder("Orphan", Uuid::new_v4(), company),
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(store.count(Collection::Directories), 0);
        assert_eq!(store.count(Collection::Permissions), 0);
    }

    #[tokio::test]
    async fn test_rename_updates_parent_stub() {
        let (tree, _) = tree();
        let company = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let root = tree
            .create_directory(Uuid::new_v4(), folder("Acme", company, company), creator)
            .await
            .unwrap();
        let child = tree
            .create_directory(Uuid::new_v4(), folder("Sales", root.id, company), creator)
            .await
            .unwrap();

        tree.update_directory(
            child.id,
            DirectoryPatch {
                title: Some("Revenue".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();

        let root = tree.get_directory(root.id).await.unwrap();
        assert_eq!(root.folders[0].title, "Revenue");
    }

    #[tokio::test]
    async fn test_relocate_moves_stub_between_parents() {
        let (tree, _) = tree();
        let company = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let a = tree
            .create_directory(Uuid::new_v4(), folder("A", company, company), creator)
            .await
            .unwrap();
        let b = tree
            .create_directory(Uuid::new_v4(), folder("B", company, company), creator)
            .await
            .unwrap();
        let moved = tree
            .create_directory(Uuid::new_v4(), folder("M", a.id, company), creator)
            .await
            .unwrap();

        tree.relocate_directory(moved.id, b.id, None).await.unwrap();

        assert!(tree.get_directory(a.id).await.unwrap().folders.is_empty());
        assert_eq!(tree.get_directory(b.id).await.unwrap().folders.len(), 1);
        assert_eq!(tree.get_directory(moved.id).await.unwrap().parent, b.id);
    }

    #[tokio::test]
    async fn test_delete_notebook_twice_is_not_found() {
        let (tree, store) = tree();
        let company = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let root = tree
            .create_directory(Uuid::new_v4(), folder("Acme", company, company), creator)
            .await
            .unwrap();
        let notebook = tree
            .create_notebook(
                Uuid::new_v4(),
                NewNotebook {
                    title: "Plan".to_string(),
                    description: String::new(),
                    parent: root.id,
                    company_id: company,
                    division_id: None,
                    blocks: Vec::new(),
                },
                creator,
            )
            .await
            .unwrap();

        tree.delete_notebook(notebook.id).await.unwrap();
        assert_eq!(store.count(Collection::Notebooks), 0);
        assert!(tree.get_directory(root.id).await.unwrap().files.is_empty());

        let err = tree.delete_notebook(notebook.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
