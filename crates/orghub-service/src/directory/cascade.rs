//! Cascade deletion of a folder subtree.
//!
//! The walk keeps an explicit stack instead of recursing. Entering a folder
//! loads it and schedules its exit before its child folders, so every child
//! folder is fully removed before its parent (post-order). Exiting a folder
//! deletes its notebooks with their permission records, then the folder and
//! its own permission record, in one document-store session.
//!
//! A failure stops the walk. Whatever was already deleted stays deleted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::traits::DocumentStore;
use orghub_docstore::TypedSession;
use orghub_entity::directory::Directory;
use orghub_entity::notebook::Notebook;
use orghub_entity::permission::Permission;

use super::tree::DIRECTORY_NOT_FOUND;

/// How the walk treats records that are already gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Any missing child record aborts the walk.
    #[default]
    Strict,
    /// Missing child records are skipped, so an interrupted walk can be resumed.
    Lenient,
}

/// Records removed by one cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Folders deleted, including the root.
    pub directories: usize,
    /// Notebooks deleted.
    pub notebooks: usize,
    /// Permission records deleted.
    pub permissions: usize,
}

enum Frame {
    Enter(Uuid),
    Exit(Directory),
}

/// Deletes folder subtrees.
#[derive(Debug, Clone)]
pub struct CascadeDeleter {
    documents: Arc<dyn DocumentStore>,
}

impl CascadeDeleter {
    /// Creates a deleter over `documents`.
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Delete `root_id` and everything reachable from it.
    ///
    /// A missing root is `NotFound` in both modes.
    pub async fn delete_tree(&self, root_id: Uuid, mode: CascadeMode) -> AppResult<CascadeReport> {
        let mut report = CascadeReport::default();
        let mut stack = vec![Frame::Enter(root_id)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    let Some(directory) = self.load(id, id == root_id, mode).await? else {
                        continue;
                    };
                    let children: Vec<Uuid> = directory.folders.iter().map(|s| s.id).collect();
                    stack.push(Frame::Exit(directory));
                    stack.extend(children.into_iter().rev().map(Frame::Enter));
                }
                Frame::Exit(directory) => {
                    self.remove_folder(&directory, mode, &mut report)
                        .await
                        .map_err(|e| e.context(format_args!("removing folder {}", directory.id)))?;
                }
            }
        }

        info!(
            root_id = %root_id,
            directories = report.directories,
            notebooks = report.notebooks,
            permissions = report.permissions,
            "Cascade delete finished"
        );
        Ok(report)
    }

    async fn load(&self, id: Uuid, is_root: bool, mode: CascadeMode) -> AppResult<Option<Directory>> {
        let mut session = self.documents.begin().await?;
        match session.get::<Directory>(id).await? {
            Some(directory) => Ok(Some(directory)),
            None if is_root => Err(AppError::not_found(DIRECTORY_NOT_FOUND)),
            None => missing(mode, "directory", id).map(|_| None),
        }
    }

    /// Delete one folder's notebooks, the folder and their permission records.
    async fn remove_folder(
        &self,
        directory: &Directory,
        mode: CascadeMode,
        report: &mut CascadeReport,
    ) -> AppResult<()> {
        let mut session = self.documents.begin().await?;
        let mut removed = CascadeReport::default();

        for file in &directory.files {
            if session.remove::<Notebook>(file.id).await? {
                removed.notebooks += 1;
            } else {
                missing(mode, "notebook", file.id)?;
            }
            if session.remove::<Permission>(file.id).await? {
                removed.permissions += 1;
            } else {
                missing(mode, "notebook permission", file.id)?;
            }
        }

        if session.remove::<Directory>(directory.id).await? {
            removed.directories += 1;
        } else {
            missing(mode, "directory", directory.id)?;
        }
        if session.remove::<Permission>(directory.id).await? {
            removed.permissions += 1;
        } else {
            missing(mode, "directory permission", directory.id)?;
        }

        session.commit().await?;
        debug!(
            directory_id = %directory.id,
            notebooks = removed.notebooks,
            "Folder removed"
        );

        report.directories += removed.directories;
        report.notebooks += removed.notebooks;
        report.permissions += removed.permissions;
        Ok(())
    }
}

fn missing(mode: CascadeMode, what: &str, id: Uuid) -> AppResult<()> {
    match mode {
        CascadeMode::Strict => Err(AppError::not_found(format!("{what} {id} not found"))),
        CascadeMode::Lenient => {
            warn!(resource = what, id = %id, "Skipping missing record during cascade");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use orghub_core::error::ErrorKind;
    use orghub_core::traits::Collection;
    use orghub_docstore::memory::MemoryDocumentStore;
    use orghub_entity::directory::NewDirectory;
    use orghub_entity::notebook::NewNotebook;

    use super::*;
    use crate::directory::tree::DirectoryTreeStore;

    struct Fixture {
        store: MemoryDocumentStore,
        tree: DirectoryTreeStore,
        cascade: CascadeDeleter,
        company: Uuid,
        creator: Uuid,
    }

    fn fixture() -> Fixture {
        let store = MemoryDocumentStore::new();
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        Fixture {
            tree: DirectoryTreeStore::new(Arc::clone(&shared)),
            cascade: CascadeDeleter::new(shared),
            store,
            company: Uuid::new_v4(),
            creator: Uuid::new_v4(),
        }
    }

    impl Fixture {
        async fn folder(&self, parent: Uuid) -> Uuid {
            self.tree
                .create_directory(
                    Uuid::new_v4(),
                    NewDirectory {
                        title: "folder".to_string(),
                        description: String::new(),
                        parent,
                        company_id: self.company,
                        division_id: None,
                    },
                    self.creator,
                )
                .await
                .unwrap()
                .id
        }

        async fn notebook(&self, parent: Uuid) -> Uuid {
            self.tree
                .create_notebook(
                    Uuid::new_v4(),
                    NewNotebook {
                        title: "notes".to_string(),
                        description: String::new(),
                        parent,
                        company_id: self.company,
                        division_id: None,
                        blocks: Vec::new(),
                    },
                    self.creator,
                )
                .await
                .unwrap()
                .id
        }

        fn total(&self) -> usize {
            Collection::ALL.iter().map(|c| self.store.count(*c)).sum()
        }
    }

    #[tokio::test]
    async fn test_cascade_removes_every_record_in_subtree() {
        let f = fixture();
        let keep = f.folder(f.company).await;
        let root = f.folder(f.company).await;
        let a = f.folder(root).await;
        let b = f.folder(a).await;
        f.notebook(root).await;
        f.notebook(a).await;
        f.notebook(b).await;
        f.notebook(b).await;

        let report = f.cascade.delete_tree(root, CascadeMode::Strict).await.unwrap();

        assert_eq!(
            report,
            CascadeReport {
                directories: 3,
                notebooks: 4,
                permissions: 7,
            }
        );
        assert_eq!(f.store.count(Collection::Notebooks), 0);
        assert_eq!(f.store.count(Collection::Directories), 1);
        assert_eq!(f.store.count(Collection::Permissions), 1);
        assert!(f.tree.get_directory(keep).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_folder_cascade() {
        let f = fixture();
        let root = f.folder(f.company).await;

        let report = f.cascade.delete_tree(root, CascadeMode::Strict).await.unwrap();
        assert_eq!(report.directories, 1);
        assert_eq!(report.permissions, 1);
        assert_eq!(f.total(), 0);
    }

    #[tokio::test]
    async fn test_redelete_is_not_found() {
        let f = fixture();
        let root = f.folder(f.company).await;
        f.cascade.delete_tree(root, CascadeMode::Strict).await.unwrap();

        for mode in [CascadeMode::Strict, CascadeMode::Lenient] {
            let err = f.cascade.delete_tree(root, mode).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound);
        }
    }

    #[tokio::test]
    async fn test_dangling_child_strict_vs_lenient() {
        let f = fixture();
        let root = f.folder(f.company).await;
        let child = f.folder(root).await;
        f.notebook(root).await;

        // Simulate an interrupted earlier cascade that removed the child only.
        let mut session = f.store.begin().await.unwrap();
        session.remove::<Directory>(child).await.unwrap();
        session.remove::<Permission>(child).await.unwrap();
        session.commit().await.unwrap();

        let err = f.cascade.delete_tree(root, CascadeMode::Strict).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains(&child.to_string()));
        assert!(f.total() > 0);

        let report = f.cascade.delete_tree(root, CascadeMode::Lenient).await.unwrap();
        assert_eq!(report.directories, 1);
        assert_eq!(report.notebooks, 1);
        assert_eq!(f.total(), 0);
    }

    #[tokio::test]
    async fn test_deep_chain_does_not_recurse() {
        let f = fixture();
        let root = f.folder(f.company).await;
        let mut parent = root;
        for _ in 0..200 {
            parent = f.folder(parent).await;
        }

        let report = f.cascade.delete_tree(root, CascadeMode::Strict).await.unwrap();
        assert_eq!(report.directories, 201);
        assert_eq!(f.total(), 0);
    }
}
