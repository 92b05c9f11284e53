//! Application configuration
//!
//! Configuration is derived fresh on every load: compiled defaults, then an
//! optional `miner.toml` file, then `MINER_*` environment overrides. Nothing
//! about the orchestration state is persisted here - the hosts table and the
//! service registry are the only durable records, and they are queried
//! directly whenever state is needed.

use crate::errors::ConfigError;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for service identity and PATH drop files
pub const APP_NAME: &str = "miner";
/// Application version reported by `miner version`
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default server port
pub const DEFAULT_PORT: u16 = 88;
/// Default server domain registered in the hosts table
pub const DEFAULT_DOMAIN: &str = "miner.local";
/// Default loopback address the domain maps to
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default external server runtime
pub const DEFAULT_RUNTIME: &str = "frankenphp";

/// Resolved application configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Port the PHP server binds to
    pub port: u16,
    /// Domain registered in the hosts table
    pub domain: String,
    /// Loopback address the domain maps to
    pub host: String,
    /// External server runtime program (name or path)
    pub runtime_program: String,
    /// Whether a missing runtime may be auto-installed during `install`
    pub runtime_auto_install: bool,
    /// Path of the running miner binary
    pub binary_path: PathBuf,
    /// Directory containing adminer.php (the document root)
    pub assets_dir: PathBuf,
    /// System hosts table path
    pub hosts_path: PathBuf,
    /// Directory the CLI wrapper scripts are installed into
    pub bin_dir: PathBuf,
    /// `paths.d`-style drop file directory, if the platform has one
    pub paths_d_dir: Option<PathBuf>,
    /// Directory holding shell profile files (the user home directory)
    pub profile_dir: Option<PathBuf>,
    /// Directory the service unit/plist is written into
    pub service_dir: Option<PathBuf>,
    /// Extracted embedded assets to delete on shutdown, if any
    pub temp_assets: Option<PathBuf>,
}

/// Optional `miner.toml` overrides
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    port: Option<u16>,
    domain: Option<String>,
    host: Option<String>,
    runtime: Option<String>,
}

impl Config {
    /// Load configuration for the detected platform
    pub fn load(platform: Platform) -> Result<Self, ConfigError> {
        Self::load_with_env(platform, |key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit environment lookup
    ///
    /// Split out so unit tests can inject overrides without mutating
    /// process-global environment variables.
    pub fn load_with_env<F>(platform: Platform, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let binary_path = std::env::current_exe()?;

        let file = Self::load_file(&env)?;

        let port = match env("MINER_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MINER_PORT".to_string(),
                value: raw,
            })?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };
        let domain = env("MINER_DOMAIN")
            .or(file.domain)
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
        let host = env("MINER_HOST")
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let runtime_program = env("MINER_RUNTIME")
            .or(file.runtime)
            .unwrap_or_else(|| DEFAULT_RUNTIME.to_string());
        let runtime_auto_install = env("MINER_RUNTIME_AUTO_INSTALL")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        let assets_dir = match env("MINER_ASSETS_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => resolve_assets_dir(&binary_path),
        };

        let hosts_path = env("MINER_HOSTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| platform.hosts_path());
        let bin_dir = env("MINER_BIN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| platform.default_bin_dir(&binary_path));
        let paths_d_dir = env("MINER_PATHS_DIR")
            .map(PathBuf::from)
            .or_else(|| platform.paths_d_dir());
        let profile_dir = env("MINER_PROFILE_DIR").map(PathBuf::from).or_else(|| {
            directories_next::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
        });
        let service_dir = env("MINER_SERVICE_DIR")
            .map(PathBuf::from)
            .or_else(|| platform.service_dir());

        let config = Config {
            port,
            domain,
            host,
            runtime_program,
            runtime_auto_install,
            binary_path,
            assets_dir,
            hosts_path,
            bin_dir,
            paths_d_dir,
            profile_dir,
            service_dir,
            temp_assets: None,
        };
        debug!(
            "Configuration loaded: domain={} port={} assets={}",
            config.domain,
            config.port,
            config.assets_dir.display()
        );
        Ok(config)
    }

    fn load_file<F>(env: &F) -> Result<ConfigFile, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = match env("MINER_CONFIG") {
            Some(explicit) => PathBuf::from(explicit),
            None => {
                let Some(dirs) = directories_next::BaseDirs::new() else {
                    return Ok(ConfigFile::default());
                };
                let default = dirs.config_dir().join(APP_NAME).join("miner.toml");
                if !default.is_file() {
                    return Ok(ConfigFile::default());
                }
                default
            }
        };

        let raw = std::fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parsing {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Full URL of the served application
    pub fn url(&self) -> String {
        if self.port == 80 {
            format!("http://{}", self.domain)
        } else {
            format!("http://{}:{}", self.domain, self.port)
        }
    }

    /// Bind address handed to the server runtime (`:<port>` form)
    pub fn listen_addr(&self) -> String {
        format!(":{}", self.port)
    }

    /// Remove extracted embedded assets, if any were created
    ///
    /// Best-effort: a failed removal only leaves a stale temp directory.
    pub fn cleanup_temp_assets(&self) {
        if let Some(dir) = &self.temp_assets {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                tracing::warn!("Failed to remove temp assets {}: {}", dir.display(), e);
            }
        }
    }
}

/// Probe the usual locations for an assets directory containing adminer.php
fn resolve_assets_dir(binary_path: &Path) -> PathBuf {
    let app_dir = binary_path.parent().unwrap_or(Path::new("."));
    let candidates = [
        app_dir.join("assets"),         // Same directory as binary
        app_dir.join("..").join("assets"), // Parent directory (for dev)
        PathBuf::from("assets"),        // Current working directory
    ];

    for candidate in &candidates {
        if candidate.join("adminer.php").is_file() {
            if let Ok(absolute) = candidate.canonicalize() {
                return absolute;
            }
            return candidate.clone();
        }
    }

    // Fall back to the expected path; the supervisor reports it if missing
    app_dir.join("assets")
}
