//! `orghub replay-intents`

use anyhow::Context;
use clap::Args;

use orghub_core::config::AppConfig;
use orghub_service::IntentReplayer;

use super::Backends;

/// Arguments for `replay-intents`.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Maximum number of intents to pick up
    #[arg(short, long, default_value_t = 100)]
    pub limit: u32,
}

/// Replay pending intents once and print the summary as JSON.
pub async fn execute(args: &ReplayArgs, config: &AppConfig) -> anyhow::Result<()> {
    let backends = Backends::connect(config).await?;
    let replayer = IntentReplayer::new(backends.stores(config));

    let summary = replayer
        .replay_pending(args.limit)
        .await
        .context("replaying intents")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if summary.failed > 0 {
        anyhow::bail!("{} intent(s) still pending", summary.failed);
    }
    Ok(())
}
