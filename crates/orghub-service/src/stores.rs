//! Shared handles every service is built from.

use std::sync::Arc;

use validator::Validate;

use orghub_auth::{AuthorizationEvaluator, IdentifierAllocator};
use orghub_core::config::AllocatorConfig;
use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::traits::DocumentStore;
use orghub_database::{RelationalStore, RelationalTx, TxMode};
use uuid::Uuid;

/// Process-wide store handles, allocator and evaluator.
///
/// Cloning is cheap; the stores are shared and never mutated after startup.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Relational store.
    pub relational: Arc<dyn RelationalStore>,
    /// Document store.
    pub documents: Arc<dyn DocumentStore>,
    /// Identifier allocator.
    pub allocator: IdentifierAllocator,
    /// Rank-based authorization.
    pub evaluator: AuthorizationEvaluator,
}

impl Stores {
    /// Bundle the stores with the default evaluator.
    pub fn new(
        relational: Arc<dyn RelationalStore>,
        documents: Arc<dyn DocumentStore>,
        allocator: &AllocatorConfig,
    ) -> Self {
        Self {
            relational,
            documents,
            allocator: IdentifierAllocator::new(allocator),
            evaluator: AuthorizationEvaluator::default(),
        }
    }

    /// Open a read-write relational transaction.
    pub async fn write(&self) -> AppResult<Box<dyn RelationalTx>> {
        self.relational.begin(TxMode::ReadWrite).await
    }

    /// Open a read-only relational transaction.
    pub async fn read(&self) -> AppResult<Box<dyn RelationalTx>> {
        self.relational.begin(TxMode::ReadOnly).await
    }

    /// Allocate one identifier in its own committed transaction.
    pub async fn allocate_id(&self) -> AppResult<Uuid> {
        let mut tx = self.write().await?;
        let id = self.allocator.allocate(tx.as_mut()).await?;
        tx.commit().await?;
        Ok(id)
    }
}

/// Run the `validator` rules of a payload.
pub fn validate_payload<T: Validate>(payload: &T) -> AppResult<()> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))
}
