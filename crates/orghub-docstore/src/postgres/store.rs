//! Document store kept as JSONB tables in PostgreSQL.
//!
//! Each [`Collection`] maps to a table `doc_<collection>` with a UUID key
//! and a JSONB body. Table names only ever come from [`table_name`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use orghub_core::config::DocumentStoreConfig;
use orghub_core::error::{AppError, ErrorKind};
use orghub_core::result::AppResult;
use orghub_core::traits::{Collection, DocumentSession, DocumentStore};
use orghub_core::with_deadline;

fn table_name(collection: Collection) -> &'static str {
    match collection {
        Collection::Directories => "doc_directories",
        Collection::Notebooks => "doc_notebooks",
        Collection::Permissions => "doc_permissions",
    }
}

fn store_error(operation: &str, err: sqlx::Error) -> AppError {
    AppError::with_source(
        ErrorKind::DocumentStore,
        format!("{operation} failed: {err}"),
        err,
    )
}

async fn guarded<T, F>(limit: Duration, operation: &str, call: F) -> AppResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    with_deadline(limit, operation, async {
        call.await.map_err(|e| store_error(operation, e))
    })
    .await
}

/// PostgreSQL JSONB document store.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgDocumentStore {
    /// Connect using the document store settings.
    pub async fn connect(config: &DocumentStoreConfig, timeout: Duration) -> AppResult<Self> {
        if config.url.is_empty() {
            return Err(AppError::configuration("document_store.url is not set"));
        }
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::DocumentStore,
                    format!("Failed to connect to document store: {e}"),
                    e,
                )
            })?;
        info!(max_connections = config.max_connections, "Connected to document store");
        Ok(Self { pool, timeout })
    }

    /// Create the collection tables if they are missing.
    pub async fn ensure_collections(&self) -> AppResult<()> {
        for collection in Collection::ALL {
            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {} (id UUID PRIMARY KEY, body JSONB NOT NULL)",
                table_name(collection)
            );
            guarded(
                self.timeout,
                "ensure_collections",
                sqlx::query(&sql).execute(&self.pool),
            )
            .await?;
        }
        info!("Document collections ready");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn begin(&self) -> AppResult<Box<dyn DocumentSession>> {
        let tx = guarded(self.timeout, "begin", self.pool.begin()).await?;
        Ok(Box::new(PgSession {
            tx,
            timeout: self.timeout,
        }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        guarded(
            self.timeout,
            "health_check",
            sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool),
        )
        .await
        .map(|v| v == 1)
    }
}

struct PgSession {
    tx: Transaction<'static, Postgres>,
    timeout: Duration,
}

#[async_trait]
impl DocumentSession for PgSession {
    async fn find(&mut self, collection: Collection, id: Uuid) -> AppResult<Option<Value>> {
        let sql = format!("SELECT body FROM {} WHERE id = $1", table_name(collection));
        guarded(
            self.timeout,
            "find_document",
            sqlx::query_scalar::<_, Value>(&sql)
                .bind(id)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn insert(&mut self, collection: Collection, id: Uuid, body: Value) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, body) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
            table_name(collection)
        );
        let result = guarded(
            self.timeout,
            "insert_document",
            sqlx::query(&sql).bind(id).bind(body).execute(&mut *self.tx),
        )
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "{collection} document {id} already exists"
            )));
        }
        Ok(())
    }

    async fn replace(&mut self, collection: Collection, id: Uuid, body: Value) -> AppResult<bool> {
        let sql = format!("UPDATE {} SET body = $2 WHERE id = $1", table_name(collection));
        let result = guarded(
            self.timeout,
            "replace_document",
            sqlx::query(&sql).bind(id).bind(body).execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&mut self, collection: Collection, id: Uuid) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table_name(collection));
        let result = guarded(
            self.timeout,
            "delete_document",
            sqlx::query(&sql).bind(id).execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn keys(&mut self, collection: Collection) -> AppResult<Vec<Uuid>> {
        let sql = format!("SELECT id FROM {} ORDER BY id", table_name(collection));
        guarded(
            self.timeout,
            "list_document_keys",
            sqlx::query_scalar::<_, Uuid>(&sql).fetch_all(&mut *self.tx),
        )
        .await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let PgSession { tx, timeout } = *self;
        guarded(timeout, "commit_documents", tx.commit()).await?;
        debug!("Document session committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_collection_has_a_distinct_table() {
        let mut names: Vec<&str> = Collection::ALL.iter().map(|c| table_name(*c)).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Collection::ALL.len());
        assert!(names.iter().all(|n| n.starts_with("doc_")));
    }
}
