//! Integration registry abstraction
//!
//! Each OS-level registration (hosts alias, CLI shims, auto-start service) is
//! an independent installer with install/uninstall/is-installed semantics.
//! Installers are idempotent: installing twice yields the same end state as
//! once, and uninstalling a never-installed record is a no-op.

use crate::errors::MinerError;
use serde::Serialize;

/// The kinds of OS-level registrations miner makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationKind {
    /// Hosts-table alias for the server domain
    HostsAlias,
    /// CLI wrapper scripts plus PATH registration
    CliShims,
    /// Auto-start registration with the OS service manager
    AutoStartService,
}

impl IntegrationKind {
    /// Human-readable label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::HostsAlias => "hosts entry",
            Self::CliShims => "CLI commands",
            Self::AutoStartService => "auto-start service",
        }
    }
}

impl std::fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One independently installable/uninstallable OS-level side effect
pub trait Integration {
    /// Which registration this installer manages
    fn kind(&self) -> IntegrationKind;

    /// Create the registration. Must be idempotent.
    fn install(&self) -> Result<(), MinerError>;

    /// Remove the registration. A no-op when never installed.
    fn uninstall(&self) -> Result<(), MinerError>;

    /// Query the real external system for the registration's presence
    fn is_installed(&self) -> Result<bool, MinerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(IntegrationKind::HostsAlias.label(), "hosts entry");
        assert_eq!(IntegrationKind::CliShims.label(), "CLI commands");
        assert_eq!(
            IntegrationKind::AutoStartService.label(),
            "auto-start service"
        );
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&IntegrationKind::HostsAlias).unwrap();
        assert_eq!(json, "\"hosts-alias\"");
        let json = serde_json::to_string(&IntegrationKind::AutoStartService).unwrap();
        assert_eq!(json, "\"auto-start-service\"");
    }
}
