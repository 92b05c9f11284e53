//! Lifecycle orchestrator
//!
//! Composes the Child Process Supervisor and the three Integration Registry
//! installers into a single install/run/uninstall protocol. Orchestration
//! state is derived on every read from the real external systems (hosts
//! table, shim directory, service registry, running flag) - there is no
//! persisted "installed" flag to drift out of sync.

use crate::config::Config;
use crate::elevation;
use crate::errors::{MinerError, Result};
use crate::hosts::HostsAlias;
use crate::platform::Platform;
use crate::registry::{Integration, IntegrationKind};
use crate::runtime;
use crate::server::{ServerEvent, ServerSupervisor};
use crate::service::{AutoStartService, ServiceStatus};
use crate::shims::CliShims;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Derived orchestration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrchestrationState {
    /// No integration records present
    NotInstalled,
    /// Integration records present, server process not running
    InstalledStopped,
    /// Integration records present, server process running
    InstalledRunning,
}

/// Outcome of one registry member during install/uninstall
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub kind: IntegrationKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Aggregated result of an install or uninstall run
///
/// Registry member failures never abort the remaining steps; they land here
/// as warnings because each integration point is independently valuable.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationReport {
    pub operation: &'static str,
    pub steps: Vec<StepReport>,
    pub warnings: Vec<String>,
}

impl IntegrationReport {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn record(&mut self, kind: IntegrationKind, outcome: std::result::Result<(), MinerError>) {
        match outcome {
            Ok(()) => self.steps.push(StepReport {
                kind,
                success: true,
                detail: None,
            }),
            Err(e) => {
                let message = format!("{} {} failed: {}", self.operation, kind, e);
                warn!("{}", message);
                self.steps.push(StepReport {
                    kind,
                    success: false,
                    detail: Some(e.to_string()),
                });
                self.warnings.push(message);
            }
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// True when every registry step succeeded
    pub fn all_steps_succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.success)
    }
}

/// The process-lifecycle and system-integration orchestrator
pub struct Orchestrator {
    config: Config,
    hosts: HostsAlias,
    shims: CliShims,
    service: AutoStartService,
    supervisor: ServerSupervisor,
}

impl Orchestrator {
    /// Build the orchestrator and the server-event channel for the surface
    pub fn new(
        config: Config,
        platform: Platform,
    ) -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let hosts = HostsAlias::new(&config);
        let shims = CliShims::new(&config, platform);
        let service = AutoStartService::new(&config, platform);
        let (supervisor, events) = ServerSupervisor::new(&config);
        (
            Self {
                config,
                hosts,
                shims,
                service,
                supervisor,
            },
            events,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn url(&self) -> String {
        self.config.url()
    }

    fn installers(&self) -> [&dyn Integration; 3] {
        [&self.hosts, &self.shims, &self.service]
    }

    /// Recompute orchestration state from the external systems
    pub fn state(&self) -> Result<OrchestrationState> {
        let mut any_installed = false;
        for installer in self.installers() {
            if installer.is_installed()? {
                any_installed = true;
                break;
            }
        }
        if !any_installed {
            return Ok(OrchestrationState::NotInstalled);
        }
        if self.supervisor.is_running() {
            Ok(OrchestrationState::InstalledRunning)
        } else {
            Ok(OrchestrationState::InstalledStopped)
        }
    }

    /// Install all OS integrations (requires elevation)
    ///
    /// Each installer runs regardless of earlier failures; the report carries
    /// a warning per failed step. The auto-start service is then started
    /// best-effort so the machine ends with a reachable server where possible.
    pub async fn install(&self) -> Result<IntegrationReport> {
        elevation::ensure_elevated("install")?;
        let mut report = IntegrationReport::new("install");

        // Make sure the PHP runtime exists before wiring integrations to it
        if self.config.runtime_auto_install {
            if let Err(e) = runtime::ensure_installed(&self.config.runtime_program).await {
                report.warn(format!(
                    "{} unavailable ({}); the server cannot start until it is installed",
                    self.config.runtime_program, e
                ));
            }
        } else if runtime::find_in_path(&self.config.runtime_program).is_none() {
            report.warn(format!(
                "{} not found on PATH and auto-install is disabled",
                self.config.runtime_program
            ));
        }

        for installer in self.installers() {
            report.record(installer.kind(), installer.install());
        }

        // Only start the service if its registration went through
        let service_registered = report
            .steps
            .iter()
            .any(|s| s.kind == IntegrationKind::AutoStartService && s.success);
        if service_registered {
            if let Err(e) = self.service.start() {
                report.warn(format!(
                    "auto-start service installed but failed to start: {}",
                    e
                ));
            } else {
                info!("Service started in background (persistent daemon)");
            }
        }

        Ok(report)
    }

    /// Remove all OS integrations (requires elevation)
    ///
    /// Stops the server first if this orchestrator is supervising one, then
    /// uninstalls every member regardless of individual failures. True
    /// `NotInstalled` is only reached when every step succeeded; residual
    /// partial state is surfaced in the report rather than papered over.
    pub async fn uninstall(&self) -> Result<IntegrationReport> {
        elevation::ensure_elevated("uninstall")?;
        let mut report = IntegrationReport::new("uninstall");

        if self.supervisor.is_running() {
            if let Err(e) = self.supervisor.stop().await {
                report.warn(format!("failed to stop server: {}", e));
            }
        }

        for installer in self.installers() {
            report.record(installer.kind(), installer.uninstall());
        }
        Ok(report)
    }

    /// Start the supervised server (foreground/daemon entry)
    ///
    /// Fatal `NotInstalled` when the hosts alias is absent: running without
    /// it would silently perform privileged mutations the user never asked
    /// for, so the caller is told to `install` first instead.
    pub async fn start_server(&self) -> Result<()> {
        if !self.hosts.is_installed()? {
            return Err(MinerError::NotInstalled);
        }
        self.supervisor.start().await?;
        Ok(())
    }

    /// Stop the supervised server
    pub async fn stop_server(&self) -> Result<()> {
        self.supervisor.stop().await?;
        Ok(())
    }

    /// Stop the server if running; used on surface teardown paths
    pub async fn shutdown(&self) {
        if self.supervisor.is_running() {
            if let Err(e) = self.supervisor.stop().await {
                warn!("Shutdown: {}", e);
            }
        }
        self.config.cleanup_temp_assets();
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// Flip the server between running and stopped; returns the new state
    pub async fn toggle_server(&self) -> Result<bool> {
        if self.supervisor.is_running() {
            self.supervisor.stop().await?;
            Ok(false)
        } else {
            self.start_server().await?;
            Ok(true)
        }
    }

    /// Flip auto-start registration; returns whether it is now enabled
    pub fn toggle_auto_start(&self) -> Result<bool> {
        if self.service.is_installed()? {
            self.service.uninstall()?;
            Ok(false)
        } else {
            self.service.install()?;
            Ok(true)
        }
    }

    /// Current auto-start service status from the OS manager
    pub fn service_status(&self) -> ServiceStatus {
        self.service.status()
    }

    /// Profile files still carrying the PATH export after uninstall
    pub fn lingering_profiles(&self) -> Vec<std::path::PathBuf> {
        self.shims.lingering_profiles()
    }
}
