//! `orghub migrate`

use anyhow::Context;
use tracing::info;

use orghub_core::config::AppConfig;
use orghub_database::migration::run_migrations;

use super::Backends;

/// Apply migrations. Connecting the document store creates its collections.
pub async fn execute(config: &AppConfig) -> anyhow::Result<()> {
    let backends = Backends::connect(config).await?;

    match backends.relational.pool() {
        Some(pool) => {
            run_migrations(pool.pool())
                .await
                .context("running relational migrations")?;
            pool.close().await;
        }
        None => info!(provider = %config.database.provider, "No relational migrations to run"),
    }

    println!("Migrations complete");
    Ok(())
}
