//! `miner install` - register all OS integrations

use anyhow::Result;
use tracing::instrument;

use super::{build_orchestrator, print_report};

#[instrument]
pub async fn execute(json: bool) -> Result<()> {
    let (orchestrator, _events) = build_orchestrator()?;

    if !json {
        println!("Installing Miner...");
        println!();
    }

    let report = orchestrator.install().await?;
    print_report(&report, json)?;

    if !json {
        println!();
        println!("✓ Installation complete!");
        println!();
        println!("To start Miner, run:");
        println!("  miner");
        println!();
        println!("Then access Adminer at: {}", orchestrator.url());
    }
    Ok(())
}
