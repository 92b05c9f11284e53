use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod surface;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let parsed = cli::Cli::parse();

    // Dispatch to CLI handler; anyhow prints the error chain on stderr and
    // the process exits 1 on any returned error
    parsed.dispatch().await
}
