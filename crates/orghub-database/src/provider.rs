//! Relational store manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use orghub_core::config::DatabaseConfig;
use orghub_core::error::AppError;
use orghub_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::memory::MemoryRelationalStore;
use crate::postgres::PgRelationalStore;
use crate::store::{RelationalStore, RelationalTx, TxMode};

/// Wraps the relational store selected by configuration.
#[derive(Debug, Clone)]
pub struct RelationalStoreManager {
    inner: Arc<dyn RelationalStore>,
    pool: Option<DatabasePool>,
}

impl RelationalStoreManager {
    /// Build the store named by `config.provider`.
    pub async fn new(config: &DatabaseConfig, timeout: Duration) -> AppResult<Self> {
        match config.provider.as_str() {
            "postgres" => {
                info!("Initializing PostgreSQL relational store");
                let pool = DatabasePool::connect(config).await?;
                let store = PgRelationalStore::new(&pool, timeout);
                Ok(Self {
                    inner: Arc::new(store),
                    pool: Some(pool),
                })
            }
            "memory" => {
                info!("Initializing in-memory relational store");
                Ok(Self::from_store(Arc::new(MemoryRelationalStore::new())))
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Supported: postgres, memory"
            ))),
        }
    }

    /// Wrap an existing store (for tests).
    pub fn from_store(store: Arc<dyn RelationalStore>) -> Self {
        Self {
            inner: store,
            pool: None,
        }
    }

    /// The PostgreSQL pool, when the PostgreSQL provider is active.
    pub fn pool(&self) -> Option<&DatabasePool> {
        self.pool.as_ref()
    }
}

#[async_trait]
impl RelationalStore for RelationalStoreManager {
    async fn begin(&self, mode: TxMode) -> AppResult<Box<dyn RelationalTx>> {
        self.inner.begin(mode).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orghub_core::error::ErrorKind;

    fn config(provider: &str) -> DatabaseConfig {
        serde_json::from_value(serde_json::json!({ "provider": provider })).unwrap()
    }

    #[tokio::test]
    async fn test_memory_provider_is_selectable() {
        let manager = RelationalStoreManager::new(&config("memory"), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(manager.pool().is_none());
        assert!(manager.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_provider_is_configuration_error() {
        let err = RelationalStoreManager::new(&config("sqlite"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
