//! Auto-start service installer
//!
//! Registers miner with the OS service manager so the server comes back on
//! boot: a systemd unit on Linux, a launchd daemon plist on macOS. The
//! installer only supplies a stable identity and the `miner daemon` entry
//! point; the daemon re-derives its configuration fresh on every service
//! start rather than trusting anything cached at install time.

use crate::config::Config;
use crate::errors::{MinerError, ServiceError};
use crate::platform::{Platform, ServiceFlavor};
use crate::registry::{Integration, IntegrationKind};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Stable service identity
pub const SERVICE_NAME: &str = "miner";
pub const SERVICE_DISPLAY_NAME: &str = "Miner Database Manager";
pub const SERVICE_DESCRIPTION: &str = "Adminer database manager powered by FrankenPHP";

/// Launchd label for the macOS daemon plist
const LAUNCHD_LABEL: &str = "local.miner.server";

/// Observed service state as reported by the OS manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Running,
    Stopped,
    Unknown,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// Auto-start registration against the platform service manager
#[derive(Debug, Clone)]
pub struct AutoStartService {
    flavor: ServiceFlavor,
    service_dir: Option<PathBuf>,
    binary_path: PathBuf,
}

impl AutoStartService {
    pub fn new(config: &Config, platform: Platform) -> Self {
        Self {
            flavor: platform.service_flavor(),
            service_dir: config.service_dir.clone(),
            binary_path: config.binary_path.clone(),
        }
    }

    /// Path of the unit/plist file this installer owns
    pub fn unit_path(&self) -> Result<PathBuf, ServiceError> {
        let dir = self.service_dir.as_ref().ok_or_else(|| self.unsupported())?;
        let file_name = match self.flavor {
            ServiceFlavor::Systemd => format!("{}.service", SERVICE_NAME),
            ServiceFlavor::Launchd => format!("{}.plist", LAUNCHD_LABEL),
            ServiceFlavor::None => return Err(self.unsupported()),
        };
        Ok(dir.join(file_name))
    }

    fn unsupported(&self) -> ServiceError {
        ServiceError::Unsupported {
            platform: Platform::detect().to_string(),
        }
    }

    /// Render the service definition for the current manager
    fn render_unit(&self) -> Result<String, ServiceError> {
        let binary = self.binary_path.display();
        match self.flavor {
            ServiceFlavor::Systemd => Ok(format!(
                "[Unit]\n\
                 Description={description}\n\
                 After=network.target\n\
                 \n\
                 [Service]\n\
                 Type=simple\n\
                 ExecStart={binary} daemon\n\
                 Restart=on-failure\n\
                 \n\
                 [Install]\n\
                 WantedBy=multi-user.target\n",
                description = SERVICE_DESCRIPTION,
                binary = binary,
            )),
            ServiceFlavor::Launchd => Ok(format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                 <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
                 <plist version=\"1.0\">\n\
                 <dict>\n\
                 \t<key>Label</key>\n\
                 \t<string>{label}</string>\n\
                 \t<key>ProgramArguments</key>\n\
                 \t<array>\n\
                 \t\t<string>{binary}</string>\n\
                 \t\t<string>daemon</string>\n\
                 \t</array>\n\
                 \t<key>RunAtLoad</key>\n\
                 \t<true/>\n\
                 \t<key>KeepAlive</key>\n\
                 \t<false/>\n\
                 </dict>\n\
                 </plist>\n",
                label = LAUNCHD_LABEL,
                binary = binary,
            )),
            ServiceFlavor::None => Err(self.unsupported()),
        }
    }

    fn manager(&self, args: &[&str]) -> Result<String, ServiceError> {
        let program = match self.flavor {
            ServiceFlavor::Systemd => "systemctl",
            ServiceFlavor::Launchd => "launchctl",
            ServiceFlavor::None => return Err(self.unsupported()),
        };
        debug!("Running {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| ServiceError::Manager {
                message: format!("failed to run {}: {}", program, e),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::Manager {
                message: format!(
                    "{} {} failed: {}",
                    program,
                    args.join(" "),
                    stderr.trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Start the registered service now
    pub fn start(&self) -> Result<(), ServiceError> {
        match self.flavor {
            ServiceFlavor::Systemd => {
                self.manager(&["start", &format!("{}.service", SERVICE_NAME)])?;
            }
            ServiceFlavor::Launchd => {
                let unit = self.unit_path()?;
                self.manager(&["load", "-w", &unit.display().to_string()])?;
            }
            ServiceFlavor::None => return Err(self.unsupported()),
        }
        Ok(())
    }

    /// Stop the registered service
    pub fn stop(&self) -> Result<(), ServiceError> {
        match self.flavor {
            ServiceFlavor::Systemd => {
                self.manager(&["stop", &format!("{}.service", SERVICE_NAME)])?;
            }
            ServiceFlavor::Launchd => {
                let unit = self.unit_path()?;
                self.manager(&["unload", &unit.display().to_string()])?;
            }
            ServiceFlavor::None => return Err(self.unsupported()),
        }
        Ok(())
    }

    /// Query the manager for the service's current state
    pub fn status(&self) -> ServiceStatus {
        match self.flavor {
            ServiceFlavor::Systemd => {
                match self.manager(&["is-active", &format!("{}.service", SERVICE_NAME)]) {
                    Ok(state) if state == "active" => ServiceStatus::Running,
                    Ok(_) => ServiceStatus::Stopped,
                    // is-active exits non-zero for inactive units
                    Err(ServiceError::Manager { message })
                        if message.contains("inactive") || message.contains("failed:") =>
                    {
                        ServiceStatus::Stopped
                    }
                    Err(_) => ServiceStatus::Unknown,
                }
            }
            ServiceFlavor::Launchd => match self.manager(&["list"]) {
                Ok(listing) if listing.contains(LAUNCHD_LABEL) => ServiceStatus::Running,
                Ok(_) => ServiceStatus::Stopped,
                Err(_) => ServiceStatus::Unknown,
            },
            ServiceFlavor::None => ServiceStatus::Unknown,
        }
    }
}

impl Integration for AutoStartService {
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::AutoStartService
    }

    fn install(&self) -> Result<(), MinerError> {
        let unit_path = self.unit_path().map_err(MinerError::from)?;
        let rendered = self.render_unit().map_err(MinerError::from)?;
        if let Some(parent) = unit_path.parent() {
            std::fs::create_dir_all(parent).map_err(ServiceError::from)?;
        }
        std::fs::write(&unit_path, rendered).map_err(ServiceError::from)?;
        info!("Wrote service definition {}", unit_path.display());

        match self.flavor {
            ServiceFlavor::Systemd => {
                self.manager(&["daemon-reload"])?;
                self.manager(&["enable", &format!("{}.service", SERVICE_NAME)])?;
            }
            // launchd registers on load; nothing further to enable
            ServiceFlavor::Launchd | ServiceFlavor::None => {}
        }
        Ok(())
    }

    fn uninstall(&self) -> Result<(), MinerError> {
        let unit_path = match self.unit_path() {
            Ok(path) => path,
            // Never registered on unsupported platforms; nothing to remove
            Err(ServiceError::Unsupported { .. }) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if !unit_path.exists() {
            debug!("Service not registered; nothing to remove");
            return Ok(());
        }

        // Best-effort stop/disable before deleting the definition
        let _ = self.stop();
        if self.flavor == ServiceFlavor::Systemd {
            let _ = self.manager(&["disable", &format!("{}.service", SERVICE_NAME)]);
        }

        std::fs::remove_file(&unit_path).map_err(ServiceError::from)?;
        if self.flavor == ServiceFlavor::Systemd {
            let _ = self.manager(&["daemon-reload"]);
        }
        info!("Removed service definition {}", unit_path.display());
        Ok(())
    }

    fn is_installed(&self) -> Result<bool, MinerError> {
        match self.unit_path() {
            Ok(path) => Ok(path.exists()),
            Err(ServiceError::Unsupported { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_in(dir: &std::path::Path, flavor: ServiceFlavor) -> AutoStartService {
        AutoStartService {
            flavor,
            service_dir: Some(dir.to_path_buf()),
            binary_path: PathBuf::from("/usr/local/bin/miner"),
        }
    }

    #[test]
    fn test_systemd_unit_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), ServiceFlavor::Systemd);

        let unit = service.render_unit().unwrap();
        assert!(unit.contains("Description=Adminer database manager powered by FrankenPHP"));
        assert!(unit.contains("ExecStart=/usr/local/bin/miner daemon"));
        assert!(unit.contains("WantedBy=multi-user.target"));
        assert!(service.unit_path().unwrap().ends_with("miner.service"));
    }

    #[test]
    fn test_launchd_plist_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), ServiceFlavor::Launchd);

        let plist = service.render_unit().unwrap();
        assert!(plist.contains("<string>local.miner.server</string>"));
        assert!(plist.contains("<string>/usr/local/bin/miner</string>"));
        assert!(plist.contains("<string>daemon</string>"));
        assert!(service
            .unit_path()
            .unwrap()
            .ends_with("local.miner.server.plist"));
    }

    #[test]
    fn test_is_installed_tracks_unit_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), ServiceFlavor::Systemd);

        assert!(!service.is_installed().unwrap());
        std::fs::write(service.unit_path().unwrap(), "[Unit]\n").unwrap();
        assert!(service.is_installed().unwrap());
    }

    #[test]
    fn test_uninstall_never_installed_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), ServiceFlavor::Systemd);
        service.uninstall().unwrap();
    }

    #[test]
    fn test_unsupported_flavor() {
        let service = AutoStartService {
            flavor: ServiceFlavor::None,
            service_dir: None,
            binary_path: PathBuf::from("miner.exe"),
        };
        assert!(matches!(
            service.start(),
            Err(ServiceError::Unsupported { .. })
        ));
        assert!(!service.is_installed().unwrap());
        assert_eq!(service.status(), ServiceStatus::Unknown);
    }
}
