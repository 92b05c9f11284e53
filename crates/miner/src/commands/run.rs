//! Default invocation - interactive control surface
//!
//! Starts the server and drives the orchestrator from menu actions read on
//! stdin. A tray toolkit would feed the same action stream; the orchestration
//! below is identical either way.

use anyhow::Result;
use tracing::instrument;

use super::build_orchestrator;
use crate::surface;

#[instrument]
pub async fn execute() -> Result<()> {
    let (orchestrator, events) = build_orchestrator()?;

    orchestrator.start_server().await?;
    println!("Miner is running.");
    println!("Access Adminer at: {}", orchestrator.url());
    println!();
    surface::print_menu();

    surface::run_interactive(&orchestrator, events).await
}
