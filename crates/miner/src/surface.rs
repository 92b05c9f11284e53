//! Control surface front-ends
//!
//! Two execution shapes share the same orchestrator contract: an interactive
//! menu loop (stdin-driven here; a tray toolkit would feed the same actions)
//! and a headless loop that only waits for a stop trigger. Every exit path -
//! quit action, OS signal, or the server dying underneath us - funnels
//! through `Orchestrator::shutdown` so the subprocess and temp assets are
//! never left behind.

use anyhow::{anyhow, Result};
use miner_core::orchestrator::Orchestrator;
use miner_core::platform::Platform;
use miner_core::server::ServerEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Actions the menu exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Open Adminer in the browser
    Open,
    /// Start or stop the server
    ToggleServer,
    /// Enable or disable auto-start on boot
    ToggleAutoStart,
    /// Show current status
    Status,
    /// Remove Miner configuration and quit
    Uninstall,
    /// Show the menu again
    Help,
    /// Quit Miner
    Quit,
}

/// Map one input line to a menu action
pub fn parse_action(line: &str) -> Option<MenuAction> {
    match line.trim().to_lowercase().as_str() {
        "open" | "o" => Some(MenuAction::Open),
        "start" | "stop" | "toggle" | "s" => Some(MenuAction::ToggleServer),
        "autostart" | "a" => Some(MenuAction::ToggleAutoStart),
        "status" => Some(MenuAction::Status),
        "uninstall" => Some(MenuAction::Uninstall),
        "help" | "menu" | "?" => Some(MenuAction::Help),
        "quit" | "exit" | "q" => Some(MenuAction::Quit),
        _ => None,
    }
}

pub fn print_menu() {
    println!("Commands:");
    println!("  open       Open Adminer in browser");
    println!("  toggle     Start/stop the server");
    println!("  autostart  Enable/disable auto-start on boot");
    println!("  status     Show current status");
    println!("  uninstall  Remove Miner configuration");
    println!("  quit       Quit Miner");
}

/// Headless form: block until a signal or the server exits on its own
///
/// A server crash is a failure here, not a clean exit: the auto-start unit
/// is registered with `Restart=on-failure`, so the service manager only
/// brings the daemon back when it exits non-zero.
pub async fn run_headless(
    orchestrator: &Orchestrator,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
) -> Result<()> {
    let result = tokio::select! {
        _ = wait_for_signal() => {
            println!("Stopping server...");
            Ok(())
        }
        event = events.recv() => match event {
            Some(ServerEvent::Exited { code }) => {
                warn!("Server process exited (status: {:?})", code);
                Err(anyhow!(
                    "server process exited unexpectedly (status: {:?})",
                    code
                ))
            }
            None => {
                info!("Event channel closed");
                Ok(())
            }
        },
    };

    orchestrator.shutdown().await;
    if result.is_ok() {
        println!("Server stopped");
    }
    result
}

/// Interactive form: menu actions plus the same stop triggers as headless
pub async fn run_interactive(
    orchestrator: &Orchestrator,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let result = loop {
        tokio::select! {
            _ = wait_for_signal() => {
                println!("Stopping server...");
                break Ok(());
            }
            event = events.recv() => {
                break handle_exit_event(event);
            }
            line = lines.next_line() => {
                match line {
                    Err(e) => break Err(e.into()),
                    // stdin closed (service manager or piped input drained)
                    Ok(None) => break Ok(()),
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match parse_action(&line) {
                            Some(MenuAction::Quit) => break Ok(()),
                            Some(MenuAction::Uninstall) => {
                                match orchestrator.uninstall().await {
                                    Ok(report) => {
                                        for warning in &report.warnings {
                                            eprintln!("Warning: {}", warning);
                                        }
                                        println!("Miner uninstalled");
                                        break Ok(());
                                    }
                                    Err(e) => eprintln!("Uninstall failed: {}", e),
                                }
                            }
                            Some(action) => handle_action(orchestrator, action).await,
                            None => {
                                eprintln!("Unknown command: {}", line.trim());
                                print_menu();
                            }
                        }
                    }
                }
            }
        }
    };

    orchestrator.shutdown().await;
    println!("Miner exited");
    result
}

async fn handle_action(orchestrator: &Orchestrator, action: MenuAction) {
    match action {
        MenuAction::Open => {
            let url = orchestrator.url();
            if let Err(e) = Platform::detect().open_browser(&url) {
                eprintln!("Failed to open browser: {}", e);
            }
        }
        MenuAction::ToggleServer => match orchestrator.toggle_server().await {
            Ok(true) => println!("Server started"),
            Ok(false) => println!("Server stopped"),
            Err(e) => eprintln!("Failed to toggle server: {}", e),
        },
        MenuAction::ToggleAutoStart => match orchestrator.toggle_auto_start() {
            Ok(true) => println!("Auto-start enabled"),
            Ok(false) => println!("Auto-start disabled"),
            Err(e) => eprintln!("Failed to toggle auto-start: {}", e),
        },
        MenuAction::Status => match orchestrator.state() {
            Ok(state) => {
                println!(
                    "State: {:?}, server {}, auto-start {}",
                    state,
                    if orchestrator.is_running() {
                        "running"
                    } else {
                        "stopped"
                    },
                    orchestrator.service_status()
                );
            }
            Err(e) => eprintln!("Failed to query state: {}", e),
        },
        // Handled by the caller
        MenuAction::Uninstall | MenuAction::Quit | MenuAction::Help => print_menu(),
    }
}

fn handle_exit_event(event: Option<ServerEvent>) -> Result<()> {
    match event {
        Some(ServerEvent::Exited { code }) => {
            warn!("Server process exited (status: {:?})", code);
            println!("Server process exited unexpectedly (status: {:?})", code);
            Ok(())
        }
        None => {
            info!("Event channel closed");
            Ok(())
        }
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_aliases() {
        assert_eq!(parse_action("open"), Some(MenuAction::Open));
        assert_eq!(parse_action("  TOGGLE  "), Some(MenuAction::ToggleServer));
        assert_eq!(parse_action("start"), Some(MenuAction::ToggleServer));
        assert_eq!(parse_action("autostart"), Some(MenuAction::ToggleAutoStart));
        assert_eq!(parse_action("uninstall"), Some(MenuAction::Uninstall));
        assert_eq!(parse_action("q"), Some(MenuAction::Quit));
        assert_eq!(parse_action("?"), Some(MenuAction::Help));
    }

    #[test]
    fn test_parse_action_rejects_unknown() {
        assert_eq!(parse_action("launch the missiles"), None);
        assert_eq!(parse_action(""), None);
    }
}
