//! Membership entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Links a user identity to a company and a company position
/// (`employee_company`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    /// Unique employee identifier.
    pub id: Uuid,
    /// User identity issued by the credential service.
    pub user_id: Uuid,
    /// Company the user belongs to.
    pub company_id: Uuid,
    /// Company-wide position.
    pub position_id: Uuid,
    /// Cleared on removal instead of deleting the row.
    pub is_active: bool,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

/// Links an employee to a department and a department position
/// (`employee_department`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DepartmentEmployee {
    /// Unique membership identifier.
    pub id: Uuid,
    /// The member.
    pub employee_id: Uuid,
    /// The department.
    pub department_id: Uuid,
    /// Department-local position.
    pub department_position_id: Uuid,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}
