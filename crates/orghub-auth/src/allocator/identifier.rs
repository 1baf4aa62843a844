//! Collision-checked identifier allocation.
//!
//! A candidate is probed in `used_uuids` and reserved there inside the
//! caller's relational transaction before it is returned. The table's
//! primary key is the uniqueness backstop: a candidate that another
//! transaction reserved first is treated like any other collision.

use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use orghub_core::config::AllocatorConfig;
use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_database::RelationalTx;

use super::source::{IdentifierSource, RandomIdentifierSource};

/// Issues identifiers unique across the relational store's namespace.
#[derive(Debug, Clone)]
pub struct IdentifierAllocator {
    source: Arc<dyn IdentifierSource>,
    max_attempts: u32,
}

impl IdentifierAllocator {
    /// Random identifiers, bounded by the configured attempt count.
    pub fn new(config: &AllocatorConfig) -> Self {
        Self::with_source(Arc::new(RandomIdentifierSource), config.max_attempts)
    }

    /// Use a custom candidate generator.
    pub fn with_source(source: Arc<dyn IdentifierSource>, max_attempts: u32) -> Self {
        Self {
            source,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Allocate and reserve a fresh identifier inside `tx`.
    ///
    /// Storage errors are returned as-is and leave `tx` for the caller to
    /// drop. The identifier is only durable once `tx` commits.
    pub async fn allocate(&self, tx: &mut dyn RelationalTx) -> AppResult<Uuid> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.source.generate();
            if candidate.is_nil() {
                warn!(attempt, "Identifier source produced a nil identifier");
                continue;
            }

            if tx.uuid_exists(candidate).await? {
                warn!(attempt, id = %candidate, "Identifier collision");
                continue;
            }

            if !tx.reserve_uuid(candidate).await? {
                warn!(attempt, id = %candidate, "Identifier reserved concurrently");
                continue;
            }

            debug!(id = %candidate, attempt, "Identifier allocated");
            return Ok(candidate);
        }

        error!(max_attempts = self.max_attempts, "Identifier allocation exhausted");
        Err(AppError::internal("identifier allocation exhausted"))
    }
}
