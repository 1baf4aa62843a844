//! Input checks applied before any store call.

use uuid::Uuid;

use crate::error::AppError;
use crate::result::AppResult;

/// Reject a nil identifier for `field`.
pub fn require_id(id: Uuid, field: &str) -> AppResult<()> {
    if id.is_nil() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Reject an empty or whitespace-only string for `field`.
pub fn require_text(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}
