//! Document store manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use orghub_core::config::DocumentStoreConfig;
use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::traits::{DocumentSession, DocumentStore};

use crate::memory::MemoryDocumentStore;
use crate::postgres::PgDocumentStore;

/// Wraps the document store selected by configuration.
#[derive(Debug, Clone)]
pub struct DocumentStoreManager {
    inner: Arc<dyn DocumentStore>,
}

impl DocumentStoreManager {
    /// Build the store named by `config.provider`.
    ///
    /// The PostgreSQL provider creates its collection tables on startup.
    pub async fn new(config: &DocumentStoreConfig, timeout: Duration) -> AppResult<Self> {
        let inner: Arc<dyn DocumentStore> = match config.provider.as_str() {
            "postgres" => {
                info!("Initializing PostgreSQL document store");
                let store = PgDocumentStore::connect(config, timeout).await?;
                store.ensure_collections().await?;
                Arc::new(store)
            }
            "memory" => {
                info!("Initializing in-memory document store");
                Arc::new(MemoryDocumentStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown document store provider: '{other}'. Supported: postgres, memory"
                )));
            }
        };
        Ok(Self { inner })
    }

    /// Wrap an existing store (for tests).
    pub fn from_store(store: Arc<dyn DocumentStore>) -> Self {
        Self { inner: store }
    }
}

#[async_trait]
impl DocumentStore for DocumentStoreManager {
    async fn begin(&self) -> AppResult<Box<dyn DocumentSession>> {
        self.inner.begin().await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orghub_core::error::ErrorKind;

    fn config(provider: &str) -> DocumentStoreConfig {
        serde_json::from_value(serde_json::json!({ "provider": provider })).unwrap()
    }

    #[tokio::test]
    async fn test_memory_provider_is_selectable() {
        let manager = DocumentStoreManager::new(&config("memory"), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(manager.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_postgres_provider_requires_url() {
        let err = DocumentStoreManager::new(&config("postgres"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_rejected() {
        let err = DocumentStoreManager::new(&config("mongodb"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
