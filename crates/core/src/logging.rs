//! Logging and observability
//!
//! This module provides structured logging setup for the CLI and daemon modes.
//! It supports both traditional text-based logging and optional JSON formatting,
//! controlled at runtime via environment variables and CLI flags.
//!
//! All logging output is directed to stderr to preserve stdout for command output.

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the logging system with an optional format specification
///
/// This function sets up tracing-subscriber with either JSON or text formatting
/// based on runtime configuration. It can be called multiple times safely -
/// subsequent calls will be no-ops.
///
/// ## Arguments
///
/// * `format` - Optional format specification string. Supports:
///   - `None` or `"text"` for human-readable text format
///   - `"json"` for structured JSON format
///
/// ## Environment Variables
///
/// * `MINER_LOG_FORMAT` - Controls the log output format ("json" for JSON, any other value for text)
/// * `MINER_LOG` - Controls the logging filter level
/// * `RUST_LOG` - Standard Rust logging environment variable (used as fallback)
pub fn init(format: Option<&str>) -> Result<()> {
    INIT.call_once(|| {
        let filter = create_env_filter();

        // Determine format from parameter or environment variable
        let env_format = std::env::var("MINER_LOG_FORMAT").ok();
        let effective_format = format.or(env_format.as_deref()).unwrap_or("text");

        match effective_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
            _ => {
                // Default to text format (including None, "text", or any other value)
                tracing_subscriber::registry()
                    .with(fmt::layer().with_target(true).with_writer(io::stderr))
                    .with(filter)
                    .init();
            }
        }

        tracing::debug!("Logging initialized with format: {}", effective_format);
    });

    Ok(())
}

/// Create an EnvFilter based on environment variables
fn create_env_filter() -> EnvFilter {
    if let Ok(miner_log) = std::env::var("MINER_LOG") {
        // Use MINER_LOG environment variable
        EnvFilter::try_new(&miner_log).unwrap_or_else(|_| {
            tracing::warn!(
                "Invalid MINER_LOG specification '{}', using default 'info'",
                miner_log
            );
            EnvFilter::new("info")
        })
    } else {
        // Fall back to standard RUST_LOG or default (info)
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Check if logging has been initialized
///
/// This is primarily useful for testing scenarios where you need to know
/// if the logging system has already been set up.
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Use a mutex to ensure tests don't interfere with each other
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_init_multiple_calls_safe() {
        let _guard = TEST_MUTEX.lock().unwrap();

        // Multiple calls should not panic or fail
        assert!(init(None).is_ok());
        assert!(init(Some("json")).is_ok());
        assert!(init(Some("text")).is_ok());
    }

    #[test]
    fn test_init_format_selection() {
        let _guard = TEST_MUTEX.lock().unwrap();

        assert!(init(None).is_ok()); // Default text format
        assert!(init(Some("json")).is_ok()); // JSON format
        assert!(init(Some("invalid")).is_ok()); // Should fall back to text format
    }

    #[test]
    fn test_env_filter_with_env_vars() {
        std::env::set_var("MINER_LOG", "trace");
        let _filter = create_env_filter();
        std::env::remove_var("MINER_LOG");

        std::env::set_var("RUST_LOG", "warn");
        let _filter = create_env_filter();
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    fn test_is_initialized() {
        let _guard = TEST_MUTEX.lock().unwrap();

        let _ = init(None);
        assert!(is_initialized());
    }
}
