//! CLI-shim installer
//!
//! Installs small wrapper scripts (`php`, `fphp`, `miner`) into a dedicated
//! bin directory and registers that directory on the command search path:
//! a `paths.d` drop file system-wide plus a marker-guarded PATH export in the
//! user's shell profiles. Re-running install never duplicates either.
//!
//! Uninstall removes the bin directory and the drop file. PATH lines already
//! appended to shell profiles are left in place and reported as a warning;
//! editing arbitrary user profiles on the way out is riskier than the stale
//! line it would remove.

use crate::config::Config;
use crate::errors::{MinerError, ShimError};
use crate::platform::Platform;
use crate::registry::{Integration, IntegrationKind};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker comment that guards profile appends
const PATH_MARKER: &str = "# Miner CLI";

/// Shell profile files considered for PATH registration
static PROFILE_FILES: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec![".zshrc", ".bashrc", ".bash_profile"]);

/// CLI wrapper-script installer
#[derive(Debug, Clone)]
pub struct CliShims {
    platform: Platform,
    bin_dir: PathBuf,
    paths_d_dir: Option<PathBuf>,
    profile_dir: Option<PathBuf>,
    url: String,
}

impl CliShims {
    pub fn new(config: &Config, platform: Platform) -> Self {
        Self {
            platform,
            bin_dir: config.bin_dir.clone(),
            paths_d_dir: config.paths_d_dir.clone(),
            profile_dir: config.profile_dir.clone(),
            url: config.url(),
        }
    }

    /// The wrapper scripts this installer manages, name → contents
    fn wrappers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("php", self.php_script()),
            ("fphp", self.fphp_script()),
            ("miner", self.miner_script()),
        ]
    }

    fn php_script(&self) -> String {
        match self.platform {
            Platform::Windows => "@echo off\nfrankenphp php-cli %*\n".to_string(),
            // Minimal alias-like wrapper to FrankenPHP's php-cli
            _ => "#!/bin/sh\nexec frankenphp php-cli \"$@\"\n".to_string(),
        }
    }

    fn fphp_script(&self) -> String {
        match self.platform {
            Platform::Windows => "@echo off\nfrankenphp %*\n".to_string(),
            _ => "#!/bin/sh\nexec frankenphp \"$@\"\n".to_string(),
        }
    }

    fn miner_script(&self) -> String {
        match self.platform {
            Platform::Windows => format!("@echo off\nstart {}\n", self.url),
            _ => format!(
                "#!/bin/sh\nopen {url} 2>/dev/null || xdg-open {url} 2>/dev/null || sensible-browser {url}\n",
                url = self.url
            ),
        }
    }

    fn wrapper_path(&self, name: &str) -> PathBuf {
        self.bin_dir
            .join(format!("{}{}", name, self.platform.shim_extension()))
    }

    /// Write one wrapper: full overwrite via a temp file renamed into place
    fn write_wrapper(&self, name: &str, content: &str) -> Result<(), ShimError> {
        let target = self.wrapper_path(name);
        let staging = self.bin_dir.join(format!(".{}.tmp", name));
        std::fs::write(&staging, content)?;
        set_executable(&staging)?;
        std::fs::rename(&staging, &target)?;
        debug!("Wrote wrapper {}", target.display());
        Ok(())
    }

    fn paths_d_file(&self) -> Option<PathBuf> {
        self.paths_d_dir
            .as_ref()
            .map(|dir| dir.join(crate::config::APP_NAME))
    }

    fn register_search_path(&self) -> Result<(), ShimError> {
        if let Some(path_file) = self.paths_d_file() {
            if let Some(parent) = path_file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let line = format!("{}\n", self.bin_dir.display());
            std::fs::write(&path_file, line)?;
        }

        // Also add to user shell profiles for immediate effect; the marker
        // keeps repeated installs from stacking duplicate exports.
        let Some(home) = &self.profile_dir else {
            return Err(ShimError::HomeUnresolvable);
        };
        let export_block = format!(
            "\n{}\nexport PATH=\"{}:$PATH\"\n",
            PATH_MARKER,
            self.bin_dir.display()
        );
        for name in PROFILE_FILES.iter() {
            let profile = home.join(name);
            if !profile.is_file() {
                continue;
            }
            let existing = std::fs::read_to_string(&profile)?;
            if existing.contains(PATH_MARKER) {
                continue;
            }
            let mut updated = existing;
            updated.push_str(&export_block);
            std::fs::write(&profile, updated)?;
            debug!("Added PATH export to {}", profile.display());
        }
        Ok(())
    }

    /// Profile files still carrying the PATH marker (reported on uninstall)
    pub fn lingering_profiles(&self) -> Vec<PathBuf> {
        let Some(home) = &self.profile_dir else {
            return Vec::new();
        };
        PROFILE_FILES
            .iter()
            .map(|name| home.join(name))
            .filter(|profile| {
                std::fs::read_to_string(profile)
                    .map(|content| content.contains(PATH_MARKER))
                    .unwrap_or(false)
            })
            .collect()
    }
}

impl Integration for CliShims {
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::CliShims
    }

    fn install(&self) -> Result<(), MinerError> {
        std::fs::create_dir_all(&self.bin_dir).map_err(ShimError::from)?;
        for (name, content) in self.wrappers() {
            self.write_wrapper(name, &content)?;
        }
        self.register_search_path()?;
        info!(
            "Registered CLI commands in {}: php, fphp, miner",
            self.bin_dir.display()
        );
        Ok(())
    }

    fn uninstall(&self) -> Result<(), MinerError> {
        match std::fs::remove_dir_all(&self.bin_dir) {
            Ok(()) => info!("Removed {}", self.bin_dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ShimError::from(e).into()),
        }
        if let Some(path_file) = self.paths_d_file() {
            if let Err(e) = std::fs::remove_file(&path_file) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(ShimError::from(e).into());
                }
            }
        }
        // Known limitation: PATH exports already written to shell profiles
        // stay behind. Surfaced, not fixed.
        for profile in self.lingering_profiles() {
            warn!(
                "PATH entry for miner remains in {}; remove the '{}' block manually if desired",
                profile.display(),
                PATH_MARKER
            );
        }
        Ok(())
    }

    fn is_installed(&self) -> Result<bool, MinerError> {
        if !self.bin_dir.is_dir() {
            return Ok(false);
        }
        Ok(self
            .wrappers()
            .iter()
            .all(|(name, _)| self.wrapper_path(name).is_file()))
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shims_in(root: &Path) -> CliShims {
        let mut config = Config::load_with_env(Platform::Linux, |_| None).unwrap();
        config.bin_dir = root.join("bin");
        config.paths_d_dir = Some(root.join("paths.d"));
        config.profile_dir = Some(root.join("home"));
        CliShims::new(&config, Platform::Linux)
    }

    #[test]
    fn test_install_creates_executable_wrappers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("home")).unwrap();
        let shims = shims_in(dir.path());

        shims.install().unwrap();

        for name in ["php", "fphp", "miner"] {
            let path = dir.path().join("bin").join(name);
            assert!(path.is_file(), "{} missing", name);
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mode = std::fs::metadata(&path).unwrap().permissions().mode();
                assert_eq!(mode & 0o111, 0o111, "{} not executable", name);
            }
        }
        let php = std::fs::read_to_string(dir.path().join("bin/php")).unwrap();
        assert!(php.starts_with("#!/bin/sh"));
        assert!(php.contains("frankenphp php-cli"));
        assert!(shims.is_installed().unwrap());
    }

    #[test]
    fn test_paths_d_drop_file_written() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("home")).unwrap();
        let shims = shims_in(dir.path());

        shims.install().unwrap();

        let drop_file = dir.path().join("paths.d/miner");
        let content = std::fs::read_to_string(&drop_file).unwrap();
        assert_eq!(content.trim(), dir.path().join("bin").display().to_string());
    }

    #[test]
    fn test_reinstall_does_not_duplicate_profile_entries() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::write(home.join(".zshrc"), "export EDITOR=vim\n").unwrap();
        std::fs::write(home.join(".bashrc"), "").unwrap();
        let shims = shims_in(dir.path());

        shims.install().unwrap();
        shims.install().unwrap();

        for name in [".zshrc", ".bashrc"] {
            let content = std::fs::read_to_string(home.join(name)).unwrap();
            let markers = content.matches(PATH_MARKER).count();
            assert_eq!(markers, 1, "duplicate PATH block in {}", name);
        }
        // Absent profiles are not created
        assert!(!home.join(".bash_profile").exists());
        // Pre-existing content survives
        let zshrc = std::fs::read_to_string(home.join(".zshrc")).unwrap();
        assert!(zshrc.starts_with("export EDITOR=vim"));
    }

    #[test]
    fn test_uninstall_removes_dir_and_reports_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::write(home.join(".bashrc"), "").unwrap();
        let shims = shims_in(dir.path());

        shims.install().unwrap();
        shims.uninstall().unwrap();

        assert!(!dir.path().join("bin").exists());
        assert!(!dir.path().join("paths.d/miner").exists());
        assert!(!shims.is_installed().unwrap());
        // Profile PATH line intentionally stays (documented limitation)
        let lingering = shims.lingering_profiles();
        assert_eq!(lingering, vec![home.join(".bashrc")]);
    }

    #[test]
    fn test_uninstall_never_installed_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let shims = shims_in(dir.path());
        assert!(!shims.is_installed().unwrap());
        shims.uninstall().unwrap();
    }

    #[test]
    fn test_windows_wrappers_are_batch_files() {
        let mut config = Config::load_with_env(Platform::Linux, |_| None).unwrap();
        config.bin_dir = PathBuf::from(r"C:\miner\bin");
        let shims = CliShims::new(&config, Platform::Windows);

        assert!(shims.wrapper_path("php").to_string_lossy().ends_with("php.bat"));
        assert!(shims.php_script().starts_with("@echo off"));
    }
}
