//! Directory document model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use orghub_core::traits::{Collection, Document};

/// Lightweight reference to a child folder or file held by its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildStub {
    /// Identifier of the child document.
    pub id: Uuid,
    /// Child title.
    pub title: String,
    /// Child description.
    #[serde(default)]
    pub description: String,
}

/// A folder in a company's document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    /// Allocator-issued identifier; also the key of its permission record.
    pub id: Uuid,
    /// Folder title.
    pub title: String,
    /// Folder description.
    #[serde(default)]
    pub description: String,
    /// Parent folder, or the company identifier for the company root folder.
    pub parent: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Department the folder belongs to, if any.
    pub division_id: Option<Uuid>,
    /// Child folders, in display order.
    #[serde(default)]
    pub folders: Vec<ChildStub>,
    /// Child notebooks, in display order.
    #[serde(default)]
    pub files: Vec<ChildStub>,
    /// Employee who created the folder.
    pub created_by: Uuid,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Directory {
    /// Build a new, empty folder from creation parameters.
    pub fn from_new(id: Uuid, new: NewDirectory, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: new.title,
            description: new.description,
            parent: new.parent,
            company_id: new.company_id,
            division_id: new.division_id,
            folders: Vec::new(),
            files: Vec::new(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// The stub the parent folder keeps for this folder.
    pub fn stub(&self) -> ChildStub {
        ChildStub {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }

    /// Check if this folder hangs directly off the company.
    pub fn is_company_root(&self) -> bool {
        self.parent == self.company_id
    }

    /// Append a child folder stub, replacing an existing stub with the same id.
    pub fn upsert_folder(&mut self, stub: ChildStub) {
        upsert(&mut self.folders, stub);
    }

    /// Append a child file stub, replacing an existing stub with the same id.
    pub fn upsert_file(&mut self, stub: ChildStub) {
        upsert(&mut self.files, stub);
    }

    /// Drop any folder or file stub referring to `child_id`. Returns true if one was removed.
    pub fn remove_child(&mut self, child_id: Uuid) -> bool {
        let before = self.folders.len() + self.files.len();
        self.folders.retain(|s| s.id != child_id);
        self.files.retain(|s| s.id != child_id);
        before != self.folders.len() + self.files.len()
    }
}

fn upsert(stubs: &mut Vec<ChildStub>, stub: ChildStub) {
    match stubs.iter_mut().find(|s| s.id == stub.id) {
        Some(existing) => *existing = stub,
        None => stubs.push(stub),
    }
}

impl Document for Directory {
    const COLLECTION: Collection = Collection::Directories;

    fn key(&self) -> Uuid {
        self.id
    }
}

/// Parameters for creating a folder.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewDirectory {
    /// Folder title.
    #[validate(length(min = 1, max = 255, message = "Folder title must be 1-255 characters"))]
    pub title: String,
    /// Folder description.
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    /// Parent folder, or the company identifier.
    pub parent: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Department the folder belongs to.
    pub division_id: Option<Uuid>,
}

/// Editable folder metadata. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DirectoryPatch {
    /// New title.
    #[validate(length(min = 1, max = 255, message = "Folder title must be 1-255 characters"))]
    pub title: Option<String>,
    /// New description.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder() -> Directory {
        let company = Uuid::new_v4();
        Directory::from_new(
            Uuid::new_v4(),
            NewDirectory {
                title: "Engineering".to_string(),
                description: String::new(),
                parent: company,
                company_id: company,
                division_id: None,
            },
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_upsert_replaces_existing_stub() {
        let mut dir = folder();
        let id = Uuid::new_v4();
        dir.upsert_folder(ChildStub {
            id,
            title: "Specs".to_string(),
            description: String::new(),
        });
        dir.upsert_folder(ChildStub {
            id,
            title: "Specifications".to_string(),
            description: "renamed".to_string(),
        });

        assert_eq!(dir.folders.len(), 1);
        assert_eq!(dir.folders[0].title, "Specifications");
    }

    #[test]
    fn test_remove_child_covers_folders_and_files() {
        let mut dir = folder();
        let file = Uuid::new_v4();
        dir.upsert_file(ChildStub {
            id: file,
            title: "Roadmap".to_string(),
            description: String::new(),
        });

        assert!(dir.remove_child(file));
        assert!(!dir.remove_child(file));
        assert!(dir.files.is_empty());
    }

    #[test]
    fn test_company_root_detection() {
        let dir = folder();
        assert!(dir.is_company_root());
    }
}
