//! Position entity models.
//!
//! Both position kinds carry an integer rank where lower is more
//! privileged. Rank 0 is the owner; ranks 0 and 1 are admin-equivalent.
//! Ranks are unique within their scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Rank held by the owner of a company or department.
pub const OWNER_RANK: i32 = 0;

/// A company-wide position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Position {
    /// Unique position identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Display name (e.g. `"owner"`, `"engineer"`).
    pub name: String,
    /// Privilege rank; lower is more privileged.
    pub rank: i32,
    /// When the position was created.
    pub created_at: DateTime<Utc>,
}

/// A position local to one department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DepartmentPosition {
    /// Unique position identifier.
    pub id: Uuid,
    /// Owning department.
    pub department_id: Uuid,
    /// Display name.
    pub name: String,
    /// Privilege rank; lower is more privileged.
    pub rank: i32,
    /// When the position was created.
    pub created_at: DateTime<Utc>,
}

/// Name and rank for a new or updated position of either scope.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PositionSpec {
    /// Display name.
    #[validate(length(min = 1, max = 100, message = "Position name must be 1-100 characters"))]
    pub name: String,
    /// Privilege rank.
    #[validate(range(min = 0, message = "Rank cannot be negative"))]
    pub rank: i32,
}
