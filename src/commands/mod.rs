//! CLI command definitions and dispatch.

pub mod health;
pub mod migrate;
pub mod replay;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use orghub_core::config::AppConfig;
use orghub_database::RelationalStoreManager;
use orghub_docstore::DocumentStoreManager;
use orghub_service::Stores;

/// OrgHub consistency core maintenance tool
#[derive(Debug, Parser)]
#[command(name = "orghub", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay to load from `config/<env>.toml`
    #[arg(short, long, env = "ORGHUB_ENV", default_value = "development")]
    pub env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply relational migrations and create document collections
    Migrate,
    /// Re-apply pending document intents once
    ReplayIntents(replay::ReplayArgs),
    /// Check that both stores are reachable
    Health,
}

impl Cli {
    /// Execute the selected command.
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        match &self.command {
            Commands::Migrate => migrate::execute(config).await,
            Commands::ReplayIntents(args) => replay::execute(args, config).await,
            Commands::Health => health::execute(config).await,
        }
    }
}

/// Both store managers built from configuration.
pub struct Backends {
    pub relational: RelationalStoreManager,
    pub documents: DocumentStoreManager,
}

impl Backends {
    /// Connect both stores.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let timeout = config.timeouts.store_call();
        let relational = RelationalStoreManager::new(&config.database, timeout)
            .await
            .context("relational store")?;
        let documents = DocumentStoreManager::new(&config.document_store, timeout)
            .await
            .context("document store")?;
        Ok(Self {
            relational,
            documents,
        })
    }

    /// Service handles over these stores.
    pub fn stores(&self, config: &AppConfig) -> Stores {
        Stores::new(
            Arc::new(self.relational.clone()),
            Arc::new(self.documents.clone()),
            &config.allocator,
        )
    }
}
