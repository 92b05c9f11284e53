//! CLI definition and dispatch

use crate::commands;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log level options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Informational messages and above
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

/// Miner subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install and configure Miner (requires admin/root)
    Install {
        /// Print the aggregated report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Run headless server (no menu) in foreground
    Daemon,

    /// Remove Miner configuration (requires admin/root)
    Uninstall {
        /// Print the aggregated report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

/// Miner - standalone database manager
///
/// Installs, supervises, and exposes a local Adminer instance served by
/// FrankenPHP at http://miner.local:88.
#[derive(Debug, Parser)]
#[command(name = "miner", version, about = "Miner - Standalone Database Manager")]
#[command(after_help = "After installation, access Adminer at: http://miner.local:88")]
pub struct Cli {
    /// Log format (text or json)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub async fn dispatch(self) -> Result<()> {
        // Initialize logging based on global options
        let log_format = match self.log_format {
            Some(LogFormat::Text) => Some("text"),
            Some(LogFormat::Json) => Some("json"),
            None => None, // Let the logging module check environment variables
        };

        let log_level = match self.log_level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };

        // Set the filter before initializing logging unless the user already did
        if std::env::var_os("MINER_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var(
                "RUST_LOG",
                format!("miner={},miner_core={}", log_level, log_level),
            );
        }
        miner_core::logging::init(log_format)?;
        tracing::debug!("CLI initialized with log level: {}", log_level);

        match self.command {
            Some(Commands::Install { json }) => commands::install::execute(json).await,
            Some(Commands::Daemon) => commands::daemon::execute().await,
            Some(Commands::Uninstall { json }) => commands::uninstall::execute(json).await,
            Some(Commands::Version) => {
                println!("Miner v{}", miner_core::config::APP_VERSION);
                Ok(())
            }
            // Default: run the interactive control surface
            None => commands::run::execute().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommand_parsing() {
        let cli = Cli::parse_from(["miner", "install"]);
        assert!(matches!(cli.command, Some(Commands::Install { json: false })));

        let cli = Cli::parse_from(["miner", "daemon"]);
        assert!(matches!(cli.command, Some(Commands::Daemon)));

        let cli = Cli::parse_from(["miner", "uninstall", "--json"]);
        assert!(matches!(cli.command, Some(Commands::Uninstall { json: true })));

        let cli = Cli::parse_from(["miner"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_log_flags() {
        let cli = Cli::parse_from(["miner", "daemon", "--log-format", "json"]);
        assert!(matches!(cli.log_format, Some(LogFormat::Json)));

        let cli = Cli::parse_from(["miner", "--log-level", "debug", "install"]);
        assert!(matches!(cli.log_level, LogLevel::Debug));
    }
}
