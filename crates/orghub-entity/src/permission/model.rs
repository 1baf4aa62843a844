//! Permission document model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use orghub_core::AppError;
use orghub_core::traits::{Collection, Document};

/// Kind of resource a permission record protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionScope {
    /// Protects a directory.
    Directory,
    /// Protects a notebook.
    Notebook,
}

impl PermissionScope {
    /// Return the scope as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Notebook => "notebook",
        }
    }
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Access granted to one actor on one resource.
///
/// Ordered by privilege: FullAccess > CommentOnly > ReadOnly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Can read, comment, edit, share and delete.
    FullAccess,
    /// Can read and comment.
    CommentOnly,
    /// Can read.
    ReadOnly,
}

impl AccessLevel {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::FullAccess => 3,
            Self::CommentOnly => 2,
            Self::ReadOnly => 1,
        }
    }

    /// Check if this level grants at least the given level.
    pub fn has_at_least(&self, required: AccessLevel) -> bool {
        self.privilege_level() >= required.privilege_level()
    }

    /// Return the level as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullAccess => "full_access",
            Self::CommentOnly => "comment_only",
            Self::ReadOnly => "read_only",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full_access" | "full" => Ok(Self::FullAccess),
            "comment_only" | "comment" => Ok(Self::CommentOnly),
            "read_only" | "read" => Ok(Self::ReadOnly),
            _ => Err(AppError::validation(format!("Invalid access level: '{s}'"))),
        }
    }
}

/// Access list for a directory or notebook.
///
/// The record's key is always the protected resource's identifier; that is
/// the only binding between the two collections. The three actor lists are
/// kept disjoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Identifier of the protected resource.
    pub id: Uuid,
    /// Actors with full access.
    #[serde(default)]
    pub full_access: Vec<Uuid>,
    /// Actors who may read and comment.
    #[serde(default)]
    pub comment_only: Vec<Uuid>,
    /// Actors who may read.
    #[serde(default)]
    pub read_only: Vec<Uuid>,
    /// Kind of the protected resource.
    pub scope: PermissionScope,
}

impl Permission {
    /// A fresh record granting full access to the creator only.
    pub fn for_creator(resource_id: Uuid, scope: PermissionScope, creator: Uuid) -> Self {
        Self {
            id: resource_id,
            full_access: vec![creator],
            comment_only: Vec::new(),
            read_only: Vec::new(),
            scope,
        }
    }

    /// The level held by `actor`, if any.
    pub fn level_of(&self, actor: Uuid) -> Option<AccessLevel> {
        if self.full_access.contains(&actor) {
            Some(AccessLevel::FullAccess)
        } else if self.comment_only.contains(&actor) {
            Some(AccessLevel::CommentOnly)
        } else if self.read_only.contains(&actor) {
            Some(AccessLevel::ReadOnly)
        } else {
            None
        }
    }

    /// Whether `actor` holds at least `required`.
    pub fn allows(&self, actor: Uuid, required: AccessLevel) -> bool {
        self.level_of(actor)
            .map(|level| level.has_at_least(required))
            .unwrap_or(false)
    }

    /// Grant `level` to `actor`, moving it out of any other list.
    pub fn grant(&mut self, actor: Uuid, level: AccessLevel) {
        self.revoke(actor);
        match level {
            AccessLevel::FullAccess => self.full_access.push(actor),
            AccessLevel::CommentOnly => self.comment_only.push(actor),
            AccessLevel::ReadOnly => self.read_only.push(actor),
        }
    }

    /// Remove `actor` from every list. Returns true if it held any access.
    pub fn revoke(&mut self, actor: Uuid) -> bool {
        let held = self.level_of(actor).is_some();
        self.full_access.retain(|a| *a != actor);
        self.comment_only.retain(|a| *a != actor);
        self.read_only.retain(|a| *a != actor);
        held
    }
}

impl Document for Permission {
    const COLLECTION: Collection = Collection::Permissions;

    fn key(&self) -> Uuid {
        self.id
    }
}
