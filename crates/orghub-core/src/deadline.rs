//! Bounded deadlines for calls into external stores.
//!
//! Every store call is abandoned once its deadline elapses and reported as
//! [`ErrorKind::Timeout`](crate::error::ErrorKind::Timeout). Nothing is
//! retried here. Dropping the returned future (client disconnect) cancels
//! the in-flight call the same way.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::AppError;
use crate::result::AppResult;

/// Run `call` with a deadline of `limit`.
pub async fn with_deadline<T, F>(limit: Duration, operation: &str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "Store call timed out");
            Err(AppError::timeout(format!(
                "{operation} exceeded its {}ms deadline",
                limit.as_millis()
            )))
        }
    }
}
