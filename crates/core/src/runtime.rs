//! FrankenPHP runtime location and automatic installation
//!
//! The server runtime is an external dependency resolved through the command
//! search path. When it is missing on Unix, `ensure_installed` downloads the
//! official install script over HTTPS, runs it in a temp directory, and moves
//! the produced binary into `/usr/local/bin`.

use crate::errors::RuntimeError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const INSTALL_SCRIPT_URL: &str = "https://frankenphp.dev/install.sh";
const INSTALL_TARGET_DIR: &str = "/usr/local/bin";

/// Locate a program through the PATH environment variable
///
/// A program name containing a path separator is treated as a direct path
/// and only checked for existence.
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(program);
        return path.is_file().then_some(path);
    }

    let paths = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&paths) {
        let candidate = dir.join(program);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        if cfg!(windows) {
            let with_exe = dir.join(format!("{}.exe", program));
            if with_exe.is_file() {
                return Some(with_exe);
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Make sure the server runtime is available, auto-installing when possible
///
/// Returns `Ok(())` immediately when the program resolves. Auto-install is
/// Unix-only; on Windows the official guidance is to use WSL.
pub async fn ensure_installed(program: &str) -> Result<(), RuntimeError> {
    if find_in_path(program).is_some() {
        debug!("{} already on PATH", program);
        return Ok(());
    }
    if cfg!(target_os = "windows") {
        return Err(RuntimeError::Unsupported);
    }

    info!("{} not found. Attempting automatic install...", program);
    let script_dir = download_install_script().await?;
    run_install_script(script_dir.path()).await?;
    place_binary(script_dir.path(), program)?;

    if find_in_path(program).is_none() {
        return Err(RuntimeError::StillMissing);
    }
    info!("{} installed successfully", program);
    Ok(())
}

/// Fetch the install script into a fresh temp directory
async fn download_install_script() -> Result<tempfile::TempDir, RuntimeError> {
    let response = reqwest::get(INSTALL_SCRIPT_URL).await?;
    if !response.status().is_success() {
        return Err(RuntimeError::Download {
            message: format!("unexpected status: {}", response.status()),
        });
    }
    let body = response.bytes().await?;

    let dir = tempfile::Builder::new()
        .prefix("frankenphp-install-")
        .tempdir()?;
    let script_path = dir.path().join("install.sh");
    std::fs::write(&script_path, &body)?;
    set_mode(&script_path, 0o755)?;
    Ok(dir)
}

async fn run_install_script(dir: &Path) -> Result<(), RuntimeError> {
    let status = tokio::process::Command::new("/bin/sh")
        .arg(dir.join("install.sh"))
        .current_dir(dir)
        .status()
        .await?;
    if !status.success() {
        return Err(RuntimeError::InstallScript {
            message: format!("exit status {}", status),
        });
    }
    Ok(())
}

/// Move the downloaded binary into the install target directory
fn place_binary(dir: &Path, program: &str) -> Result<(), RuntimeError> {
    let local = dir.join(program);
    if !local.is_file() {
        return Err(RuntimeError::InstallScript {
            message: format!("{} missing after install script", local.display()),
        });
    }
    let target = Path::new(INSTALL_TARGET_DIR).join(program);

    // Rename fails across filesystems; fall back to copy
    if std::fs::rename(&local, &target).is_err() {
        std::fs::copy(&local, &target)?;
    }
    set_mode(&target, 0o755)?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_in_path_resolves_common_program() {
        // `sh` exists on every Unix test environment
        #[cfg(unix)]
        assert!(find_in_path("sh").is_some());
    }

    #[test]
    fn test_find_in_path_missing_program() {
        assert!(find_in_path("definitely-not-a-real-program-xyz").is_none());
    }

    #[test]
    fn test_find_in_path_direct_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("runtime");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();

        let as_str = script.to_str().unwrap();
        assert_eq!(find_in_path(as_str), Some(script.clone()));

        let missing = dir.path().join("absent");
        assert!(find_in_path(missing.to_str().unwrap()).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_bit_required() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("tool");
        std::fs::write(&plain, "").unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!is_executable(&plain));

        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(is_executable(&plain));
    }
}
