//! Child Process Supervisor for the FrankenPHP server
//!
//! Owns the lifecycle of exactly one `frankenphp php-server` subprocess.
//! A background watcher task takes ownership of the spawned child and is the
//! only place the process is waited on: an out-of-band exit (crash, external
//! kill) flips the shared running flag and publishes a single
//! `ServerEvent::Exited` to the subscriber, while `stop()` routes a graceful
//! shutdown request through the same task so the two paths never race over
//! the child handle.

use crate::config::Config;
use crate::errors::ServerError;
use crate::runtime::find_in_path;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// How long `stop()` waits after SIGTERM before force-killing
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Entry file expected under the document root
const ENTRY_FILE: &str = "adminer.php";

/// Terminal state change published by the watcher task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The subprocess exited on its own (not via `stop()`)
    Exited { code: Option<i32> },
}

/// Shutdown request carried to the watcher: an ack channel to signal on
type ShutdownRequest = oneshot::Sender<()>;

#[derive(Debug, Default)]
struct SupervisorState {
    running: bool,
    pid: Option<u32>,
    shutdown: Option<oneshot::Sender<ShutdownRequest>>,
}

/// Supervisor for the single server subprocess
#[derive(Debug, Clone)]
pub struct ServerSupervisor {
    program: String,
    port: u16,
    domain: String,
    assets_dir: PathBuf,
    state: Arc<Mutex<SupervisorState>>,
    events: mpsc::UnboundedSender<ServerEvent>,
}

impl ServerSupervisor {
    /// Create a supervisor and the event channel its watcher publishes on
    pub fn new(config: &Config) -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            program: config.runtime_program.clone(),
            port: config.port,
            domain: config.domain.clone(),
            assets_dir: config.assets_dir.clone(),
            state: Arc::new(Mutex::new(SupervisorState::default())),
            events: events_tx,
        };
        (supervisor, events_rx)
    }

    fn lock(&self) -> MutexGuard<'_, SupervisorState> {
        // A poisoned lock only means a panicking task dropped the guard;
        // the flag itself is still the best available state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawn the server subprocess and register the exit watcher
    ///
    /// Must run inside a tokio runtime. Success means the subprocess has been
    /// launched, not that it is accepting connections yet.
    pub async fn start(&self) -> Result<(), ServerError> {
        let program_path =
            find_in_path(&self.program).ok_or_else(|| ServerError::DependencyMissing {
                program: self.program.clone(),
            })?;

        let entry = self.assets_dir.join(ENTRY_FILE);
        if !entry.is_file() {
            return Err(ServerError::DocumentRootInvalid {
                path: self.assets_dir.display().to_string(),
            });
        }

        let mut state = self.lock();
        if state.running {
            return Err(ServerError::AlreadyRunning);
        }

        // Bind only to the port; hosts file + Host header handle the domain
        let listen = format!(":{}", self.port);
        let mut child = Command::new(&program_path)
            .arg("php-server")
            .arg("-r")
            .arg(&self.assets_dir)
            .arg("--listen")
            .arg(&listen)
            .current_dir(&self.assets_dir)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ServerError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        let pid = child.id();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        state.running = true;
        state.pid = pid;
        state.shutdown = Some(shutdown_tx);
        drop(state);

        info!(
            "{} php-server started on http://{}:{} (pid {:?})",
            self.program, self.domain, self.port, pid
        );

        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    // Out-of-band exit: crash or external kill
                    let code = status.as_ref().ok().and_then(|s| s.code());
                    warn!("Server process exited unexpectedly (status: {:?})", code);
                    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
                    state.running = false;
                    state.pid = None;
                    state.shutdown = None;
                    drop(state);
                    let _ = events.send(ServerEvent::Exited { code });
                }
                request = shutdown_rx => {
                    if let Ok(ack) = request {
                        if let Some(pid) = pid {
                            terminate_gracefully(&mut child, pid).await;
                        } else {
                            let _ = child.kill().await;
                        }
                        let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
                        state.running = false;
                        state.pid = None;
                        state.shutdown = None;
                        drop(state);
                        let _ = ack.send(());
                    }
                }
            }
        });

        Ok(())
    }

    /// Stop the supervised subprocess
    ///
    /// Sends a graceful termination signal and waits up to the grace period
    /// before the watcher force-kills. The handle is cleared on return even
    /// if the process outlives the signal.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let shutdown = {
            let mut state = self.lock();
            if !state.running {
                return Err(ServerError::NotRunning);
            }
            state.shutdown.take()
        };

        match shutdown {
            Some(shutdown) => {
                let (ack_tx, ack_rx) = oneshot::channel();
                if shutdown.send(ack_tx).is_ok() {
                    // The watcher signals once the process is down (or killed)
                    let wait = STOP_GRACE_PERIOD + Duration::from_secs(2);
                    if tokio::time::timeout(wait, ack_rx).await.is_err() {
                        warn!("Timed out waiting for server shutdown ack");
                    }
                }
            }
            // The watcher observed an exit between our check and take
            None => debug!("Server already exiting; nothing to signal"),
        }

        let mut state = self.lock();
        state.running = false;
        state.pid = None;
        state.shutdown = None;
        info!("Server stopped");
        Ok(())
    }

    /// Non-blocking view of the last observed process state
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Process id of the live subprocess, if any
    pub fn pid(&self) -> Option<u32> {
        self.lock().pid
    }

    /// Full URL of the served application
    pub fn url(&self) -> String {
        if self.port == 80 {
            format!("http://{}", self.domain)
        } else {
            format!("http://{}:{}", self.domain, self.port)
        }
    }
}

/// SIGTERM, bounded wait, then SIGKILL
async fn terminate_gracefully(child: &mut tokio::process::Child, pid: u32) {
    if send_sigterm(pid).await {
        match tokio::time::timeout(STOP_GRACE_PERIOD, child.wait()).await {
            Ok(_) => {
                debug!("Server exited within grace period");
                return;
            }
            Err(_) => warn!("Server ignored SIGTERM; force-killing"),
        }
    }
    let _ = child.kill().await;
    let _ = child.wait().await;
}

#[cfg(unix)]
async fn send_sigterm(pid: u32) -> bool {
    // Shelling out keeps the crate free of unsafe libc calls
    Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(not(unix))]
async fn send_sigterm(_pid: u32) -> bool {
    // No SIGTERM equivalent; the caller falls through to a hard kill
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Build a supervisor around a stub server script that just sleeps
    fn stub_supervisor(
        root: &Path,
    ) -> (ServerSupervisor, mpsc::UnboundedReceiver<ServerEvent>) {
        let assets = root.join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::write(assets.join("adminer.php"), "<?php\n").unwrap();

        let program = root.join("fake-server");
        std::fs::write(&program, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = Config::load_with_env(Platform::Linux, |_| None).unwrap();
        config.runtime_program = program.display().to_string();
        config.assets_dir = assets;
        config.port = 8899;
        ServerSupervisor::new(&config)
    }

    #[tokio::test]
    async fn test_start_then_stop() {
        let dir = tempfile::tempdir().unwrap();
        let (supervisor, _events) = stub_supervisor(dir.path());

        assert!(!supervisor.is_running());
        supervisor.start().await.unwrap();
        assert!(supervisor.is_running());
        assert!(supervisor.pid().is_some());

        supervisor.stop().await.unwrap();
        assert!(!supervisor.is_running());
        assert!(supervisor.pid().is_none());
    }

    #[tokio::test]
    async fn test_start_while_running_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (supervisor, _events) = stub_supervisor(dir.path());

        supervisor.start().await.unwrap();
        let second = supervisor.start().await;
        assert!(matches!(second, Err(ServerError::AlreadyRunning)));
        // The first instance is unaffected
        assert!(supervisor.is_running());

        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_while_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let (supervisor, _events) = stub_supervisor(dir.path());

        let result = supervisor.stop().await;
        assert!(matches!(result, Err(ServerError::NotRunning)));
    }

    #[tokio::test]
    async fn test_missing_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let (supervisor, _events) = stub_supervisor(dir.path());
        let mut config = Config::load_with_env(Platform::Linux, |_| None).unwrap();
        config.runtime_program = "definitely-not-a-real-program-xyz".to_string();
        config.assets_dir = dir.path().join("assets");
        let (missing, _rx) = ServerSupervisor::new(&config);

        let result = missing.start().await;
        assert!(matches!(result, Err(ServerError::DependencyMissing { .. })));
        drop(supervisor);
    }

    #[tokio::test]
    async fn test_missing_entry_file() {
        let dir = tempfile::tempdir().unwrap();
        let (supervisor, _events) = stub_supervisor(dir.path());
        std::fs::remove_file(dir.path().join("assets/adminer.php")).unwrap();

        let result = supervisor.start().await;
        assert!(matches!(
            result,
            Err(ServerError::DocumentRootInvalid { .. })
        ));
        assert!(!supervisor.is_running());
    }

    #[tokio::test]
    async fn test_external_kill_observed_without_stop() {
        let dir = tempfile::tempdir().unwrap();
        let (supervisor, mut events) = stub_supervisor(dir.path());

        supervisor.start().await.unwrap();
        let pid = supervisor.pid().unwrap();

        // Kill the process out-of-band, as a crash would
        std::process::Command::new("kill")
            .arg("-9")
            .arg(pid.to_string())
            .status()
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("watcher should publish the exit")
            .expect("event channel open");
        assert!(matches!(event, ServerEvent::Exited { .. }));
        assert!(!supervisor.is_running());

        // And a subsequent stop reports NotRunning
        assert!(matches!(
            supervisor.stop().await,
            Err(ServerError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let dir = tempfile::tempdir().unwrap();
        let (supervisor, _events) = stub_supervisor(dir.path());

        supervisor.start().await.unwrap();
        supervisor.stop().await.unwrap();
        supervisor.start().await.unwrap();
        assert!(supervisor.is_running());
        supervisor.stop().await.unwrap();
    }

    #[test]
    fn test_url_formatting() {
        let mut config = Config::load_with_env(Platform::Linux, |_| None).unwrap();
        config.port = 88;
        let (supervisor, _rx) = ServerSupervisor::new(&config);
        assert_eq!(supervisor.url(), "http://miner.local:88");

        config.port = 80;
        let (supervisor, _rx) = ServerSupervisor::new(&config);
        assert_eq!(supervisor.url(), "http://miner.local");
    }
}
