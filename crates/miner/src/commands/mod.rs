//! Command implementations
//!
//! This module contains implementations for all CLI subcommands.

pub mod daemon;
pub mod install;
pub mod run;
pub mod uninstall;

use anyhow::Result;
use miner_core::config::Config;
use miner_core::orchestrator::{IntegrationReport, Orchestrator};
use miner_core::platform::Platform;
use miner_core::server::ServerEvent;
use tokio::sync::mpsc;

/// Build the orchestrator from freshly derived configuration
pub(crate) fn build_orchestrator() -> Result<(Orchestrator, mpsc::UnboundedReceiver<ServerEvent>)>
{
    let platform = Platform::detect();
    let config = Config::load(platform)?;
    Ok(Orchestrator::new(config, platform))
}

/// Print an install/uninstall report: JSON on stdout or ✓/warning text lines
pub(crate) fn print_report(report: &IntegrationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for step in &report.steps {
        if step.success {
            println!("✓ {}", step.kind);
        } else {
            println!(
                "✗ {}: {}",
                step.kind,
                step.detail.as_deref().unwrap_or("failed")
            );
        }
    }
    for warning in &report.warnings {
        eprintln!("  Warning: {}", warning);
    }
    Ok(())
}
