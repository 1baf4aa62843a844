//! `orghub health`

use orghub_core::config::AppConfig;
use orghub_core::traits::DocumentStore;
use orghub_database::RelationalStore;

use super::Backends;

/// Check both stores and fail unless both answer.
pub async fn execute(config: &AppConfig) -> anyhow::Result<()> {
    let backends = Backends::connect(config).await?;

    let relational = backends.relational.health_check().await.unwrap_or(false);
    let documents = backends.documents.health_check().await.unwrap_or(false);

    println!(
        "{}",
        serde_json::json!({ "relational": relational, "documents": documents })
    );
    if !(relational && documents) {
        anyhow::bail!("store health check failed");
    }
    Ok(())
}
