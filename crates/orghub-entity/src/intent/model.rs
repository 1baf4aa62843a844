//! Document intent entity model.
//!
//! An intent is written in the same relational transaction as the rows it
//! belongs to and describes the document-store step that must follow the
//! commit. It stays `pending` until that step is confirmed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Document-store operation an intent stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "intent_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Create a company or department root folder.
    CreateRootDirectory,
    /// Cascade-delete a folder subtree.
    DeleteDirectory,
}

/// Lifecycle of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "intent_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    /// Not yet confirmed by the document store.
    Pending,
    /// Applied and confirmed.
    Completed,
}

/// A recorded document-store operation (`document_intents`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DocumentIntent {
    /// Unique intent identifier.
    pub id: Uuid,
    /// Operation to apply.
    pub kind: IntentKind,
    /// Folder created or deleted.
    pub target_id: Uuid,
    /// Parent folder (or company identifier) of the target folder.
    pub parent_id: Option<Uuid>,
    /// Owning company.
    pub company_id: Uuid,
    /// Department the folder belongs to.
    pub division_id: Option<Uuid>,
    /// Employee recorded as creator.
    pub created_by: Uuid,
    /// Title of a folder to create.
    pub title: Option<String>,
    /// Current status.
    pub status: IntentStatus,
    /// Number of failed attempts.
    pub attempts: i32,
    /// Error from the most recent failed attempt.
    pub last_error: Option<String>,
    /// When the intent was recorded.
    pub created_at: DateTime<Utc>,
    /// When the intent was confirmed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl DocumentIntent {
    /// A pending intent to create a root folder under `parent_id`.
    pub fn create_root_directory(
        id: Uuid,
        target_id: Uuid,
        parent_id: Uuid,
        company_id: Uuid,
        division_id: Option<Uuid>,
        created_by: Uuid,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: IntentKind::CreateRootDirectory,
            target_id,
            parent_id: Some(parent_id),
            company_id,
            division_id,
            created_by,
            title: Some(title.into()),
            status: IntentStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// A pending intent to cascade-delete the subtree rooted at `target_id`
    /// and detach it from `parent_id`.
    pub fn delete_directory(
        id: Uuid,
        target_id: Uuid,
        parent_id: Option<Uuid>,
        company_id: Uuid,
        division_id: Option<Uuid>,
        created_by: Uuid,
    ) -> Self {
        Self {
            id,
            kind: IntentKind::DeleteDirectory,
            target_id,
            parent_id,
            company_id,
            division_id,
            created_by,
            title: None,
            status: IntentStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Check if the intent still awaits confirmation.
    pub fn is_pending(&self) -> bool {
        self.status == IntentStatus::Pending
    }
}
