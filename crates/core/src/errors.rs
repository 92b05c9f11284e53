//! Error types and handling
//!
//! This module provides domain-specific error types for the orchestrator.
//! The taxonomy is structured with specific error enums for each domain
//! (Server, Hosts, Shim, Service, Runtime, Config) that are then wrapped in
//! the main MinerError enum for unified error handling.

use thiserror::Error;

/// Child-process supervisor errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// A supervised server process is already live
    #[error("server is already running")]
    AlreadyRunning,

    /// No supervised server process is live
    #[error("server is not running")]
    NotRunning,

    /// The external server runtime could not be located
    #[error("{program} not found on PATH. Install it with: curl https://frankenphp.dev/install.sh | sh")]
    DependencyMissing { program: String },

    /// The served entry file is absent under the document root
    #[error("adminer.php not found in document root: {path}")]
    DocumentRootInvalid { path: String },

    /// Spawning the server subprocess failed
    #[error("failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Hosts-table installer errors
#[derive(Error, Debug)]
pub enum HostsError {
    /// Hosts file read/write error
    #[error("hosts file I/O error")]
    Io(#[from] std::io::Error),
}

/// CLI-shim installer errors
#[derive(Error, Debug)]
pub enum ShimError {
    /// Wrapper script or PATH file read/write error
    #[error("shim file I/O error")]
    Io(#[from] std::io::Error),

    /// Home directory could not be resolved for profile updates
    #[error("unable to resolve the user home directory")]
    HomeUnresolvable,
}

/// Auto-start service installer errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Service registration is not available on this platform
    #[error("auto-start service is not supported on {platform}")]
    Unsupported { platform: String },

    /// The OS service manager rejected the request
    #[error("service manager error: {message}")]
    Manager { message: String },

    /// Service unit file read/write error
    #[error("service file I/O error")]
    Io(#[from] std::io::Error),
}

/// Server-runtime (FrankenPHP) locator and installer errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Automatic runtime installation is not available on this platform
    #[error("FrankenPHP auto-install is unsupported on this platform; use WSL: curl https://frankenphp.dev/install.sh | sh")]
    Unsupported,

    /// Install script download failed
    #[error("failed to download install script: {message}")]
    Download { message: String },

    /// Install script execution failed
    #[error("install script failed: {message}")]
    InstallScript { message: String },

    /// Runtime still missing after a successful-looking install
    #[error("frankenphp not found on PATH after install")]
    StillMissing,

    /// HTTP transport error
    #[error("install script request error")]
    Http(#[from] reqwest::Error),

    /// Local file I/O error
    #[error("runtime install I/O error")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file parsing error
    #[error("failed to parse configuration file: {message}")]
    Parsing { message: String },

    /// An override carries a value the field cannot hold
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// Configuration file I/O error
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),
}

/// Main error enum wrapping all domain-specific errors
#[derive(Error, Debug)]
pub enum MinerError {
    /// Child-process supervisor errors
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// Hosts-table installer errors
    #[error("hosts error: {0}")]
    Hosts(#[from] HostsError),

    /// CLI-shim installer errors
    #[error("shim error: {0}")]
    Shim(#[from] ShimError),

    /// Auto-start service installer errors
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Server-runtime installer errors
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An operation that needs the hosts alias ran before `install`
    #[error("miner is not installed yet. Run: sudo miner install")]
    NotInstalled,

    /// A privileged operation ran without administrator rights
    #[error("administrator/root privileges required. Re-run with: sudo miner {operation}")]
    ElevationRequired { operation: String },
}

/// Convenience type alias for Results with MinerError
pub type Result<T> = std::result::Result<T, MinerError>;
