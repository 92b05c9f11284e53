//! Platform detection and OS capability selection
//!
//! The orchestration code never branches on the operating system inline.
//! Instead a `Platform` value is detected once at startup and consulted for
//! every OS-specific location or mechanism: the hosts file path, the PATH
//! registration mechanism, the service manager flavor, and the browser opener.

use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Platform types supported by miner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Native Linux
    Linux,
    /// macOS
    MacOS,
    /// Native Windows
    Windows,
}

/// Service manager flavor used for auto-start registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFlavor {
    /// systemd units managed via `systemctl`
    Systemd,
    /// launchd plists managed via `launchctl`
    Launchd,
    /// No supported service manager
    None,
}

impl Platform {
    /// Detect the current platform environment
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOS
        } else {
            // Treat unknown Unix-like systems as Linux
            Platform::Linux
        }
    }

    /// Default location of the system hosts table
    pub fn hosts_path(self) -> PathBuf {
        match self {
            Platform::Windows => {
                let windir = std::env::var("WINDIR").unwrap_or_else(|_| r"C:\Windows".to_string());
                PathBuf::from(windir)
                    .join("System32")
                    .join("drivers")
                    .join("etc")
                    .join("hosts")
            }
            _ => PathBuf::from("/etc/hosts"),
        }
    }

    /// Default directory for the CLI wrapper scripts
    pub fn default_bin_dir(self, binary_path: &std::path::Path) -> PathBuf {
        match self {
            // On Windows keep wrappers next to the binary
            Platform::Windows => {
                let base = binary_path.parent().unwrap_or(std::path::Path::new("."));
                if base.file_name().map(|n| n == "bin").unwrap_or(false) {
                    base.to_path_buf()
                } else {
                    base.join("bin")
                }
            }
            // On Unix, a stable system-wide location
            _ => PathBuf::from("/usr/local/miner/bin"),
        }
    }

    /// Directory for `paths.d`-style PATH drop files, if the platform has one
    pub fn paths_d_dir(self) -> Option<PathBuf> {
        match self {
            Platform::Windows => None,
            _ => Some(PathBuf::from("/etc/paths.d")),
        }
    }

    /// Directory the service unit/plist is registered under
    pub fn service_dir(self) -> Option<PathBuf> {
        match self.service_flavor() {
            ServiceFlavor::Systemd => Some(PathBuf::from("/etc/systemd/system")),
            ServiceFlavor::Launchd => Some(PathBuf::from("/Library/LaunchDaemons")),
            ServiceFlavor::None => None,
        }
    }

    /// Which service manager handles auto-start registration
    pub fn service_flavor(self) -> ServiceFlavor {
        match self {
            Platform::Linux => ServiceFlavor::Systemd,
            Platform::MacOS => ServiceFlavor::Launchd,
            Platform::Windows => ServiceFlavor::None,
        }
    }

    /// File extension for CLI wrapper scripts
    pub fn shim_extension(self) -> &'static str {
        match self {
            Platform::Windows => ".bat",
            _ => "",
        }
    }

    /// Launch the default browser for a URL (fire-and-forget)
    pub fn open_browser(self, url: &str) -> std::io::Result<()> {
        let mut cmd = match self {
            Platform::MacOS => {
                let mut c = Command::new("open");
                c.arg(url);
                c
            }
            Platform::Windows => {
                let mut c = Command::new("cmd");
                c.args(["/c", "start", url]);
                c
            }
            Platform::Linux => {
                let mut c = Command::new("xdg-open");
                c.arg(url);
                c
            }
        };
        debug!("Opening browser for {}", url);
        cmd.spawn().map(|_| ())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Platform::Linux => "linux",
            Platform::MacOS => "macos",
            Platform::Windows => "windows",
        };
        write!(f, "{}", name)
    }
}
