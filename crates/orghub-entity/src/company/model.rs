//! Company entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A tenant. Root of the department tree and of the company document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Company {
    /// Unique company identifier.
    pub id: Uuid,
    /// User identity of the registering owner.
    pub owner_id: Uuid,
    /// Company name (unique).
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Soft-deactivation flag. Companies are never hard-deleted.
    pub is_active: bool,
    /// Identifier of the company's root folder in the document store.
    pub root_directory_id: Uuid,
    /// When the company was registered.
    pub created_at: DateTime<Utc>,
    /// When the company was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Payload for registering a new company.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterCompany {
    /// Company name.
    #[validate(length(min = 1, max = 200, message = "Company name must be 1-200 characters"))]
    pub name: String,
    /// Contact email.
    #[validate(email(message = "Contact email is not a valid address"))]
    pub email: Option<String>,
    /// Contact phone number.
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    /// Postal address.
    #[validate(length(max = 500))]
    pub address: Option<String>,
}
