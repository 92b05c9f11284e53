//! `miner daemon` - headless server, foreground until signalled
//!
//! This is also the entry point the auto-start service registration runs:
//! configuration is re-derived fresh here on every start, never trusted from
//! install time.

use anyhow::Result;
use tracing::instrument;

use super::build_orchestrator;
use crate::surface;

#[instrument]
pub async fn execute() -> Result<()> {
    let (orchestrator, events) = build_orchestrator()?;

    orchestrator.start_server().await?;
    println!("Headless server running on {}. Press Ctrl+C to stop.", orchestrator.url());

    surface::run_headless(&orchestrator, events).await
}
