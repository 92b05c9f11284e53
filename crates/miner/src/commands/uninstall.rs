//! `miner uninstall` - remove all OS integrations

use anyhow::Result;
use tracing::instrument;

use super::{build_orchestrator, print_report};

#[instrument]
pub async fn execute(json: bool) -> Result<()> {
    let (orchestrator, _events) = build_orchestrator()?;

    if !json {
        println!("Uninstalling Miner...");
        println!();
    }

    let report = orchestrator.uninstall().await?;
    print_report(&report, json)?;

    // PATH exports left in shell profiles are a documented limitation
    for profile in orchestrator.lingering_profiles() {
        eprintln!(
            "  Note: PATH entry remains in {}; remove the '# Miner CLI' block manually",
            profile.display()
        );
    }

    if !json {
        println!();
        if report.all_steps_succeeded() {
            println!("✓ Uninstallation complete!");
        } else {
            println!("Uninstallation finished with warnings; some integrations may remain.");
        }
    }
    Ok(())
}
