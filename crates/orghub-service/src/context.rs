//! Request context carrying the resolved acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for the current request.
///
/// The boundary authenticates the caller and hands the core a resolved
/// user identity; every service method takes it as the acting user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's identity.
    pub user_id: Uuid,
    /// Correlation identifier for logs.
    pub request_id: Uuid,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for `user_id`.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            request_id: Uuid::new_v4(),
            request_time: Utc::now(),
        }
    }
}
