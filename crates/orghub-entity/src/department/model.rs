//! Department entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A node in a company's department tree.
///
/// Top-level departments use the company identifier as `parent_id`, which
/// roots the tree at the company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Department {
    /// Unique department identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Parent department, or the company identifier for top-level departments.
    pub parent_id: Uuid,
    /// Department name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Identifier of the department's root folder in the document store.
    pub root_directory_id: Uuid,
    /// When the department was created.
    pub created_at: DateTime<Utc>,
    /// When the department was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Department {
    /// Check if this department hangs directly off the company.
    pub fn is_top_level(&self) -> bool {
        self.parent_id == self.company_id
    }
}

/// Payload for creating a department.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDepartment {
    /// Department name.
    #[validate(length(min = 1, max = 200, message = "Department name must be 1-200 characters"))]
    pub name: String,
    /// Free-form description.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Parent department. `None` places the department directly under the company.
    pub parent_id: Option<Uuid>,
}

/// Payload for updating a department. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateDepartment {
    /// New name.
    #[validate(length(min = 1, max = 200, message = "Department name must be 1-200 characters"))]
    pub name: Option<String>,
    /// New description.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// New parent department, or the company identifier to move it to the top level.
    pub parent_id: Option<Uuid>,
}
