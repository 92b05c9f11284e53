//! Elevated-privilege detection
//!
//! The orchestrator only consumes the capability: privileged operations check
//! it and fail fast with `ElevationRequired`. Acquiring elevation (sudo,
//! pkexec, UAC re-exec) is left to the caller.

use crate::errors::MinerError;
use std::process::Command;
use tracing::debug;

/// Check whether the current process has administrator/root privileges
pub fn is_elevated() -> bool {
    if cfg!(target_os = "windows") {
        // `net session` succeeds only from an elevated shell
        return Command::new("net")
            .arg("session")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
    }

    // Shelling out to `id -u` avoids unsafe libc calls
    let euid = Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8_lossy(&o.stdout).trim().parse::<u32>().ok());
    debug!("Effective uid: {:?}", euid);
    euid == Some(0)
}

/// Fail with `ElevationRequired` unless the process holds admin rights
pub fn ensure_elevated(operation: &str) -> Result<(), MinerError> {
    if is_elevated() {
        Ok(())
    } else {
        Err(MinerError::ElevationRequired {
            operation: operation.to_string(),
        })
    }
}
