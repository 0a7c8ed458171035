//! UI-agnostic facade over supervisor, arguments and autostart
//!
//! Every operation here logs its own failures and never returns an error,
//! so a menu callback cannot bring the tray down.

use crate::autostart::AutostartRegistrar;
use crate::config::{LauncherConfig, Paths};
use crate::error::Result;
use crate::service::{self, ServiceDependency};
use crate::supervisor::{ArgumentStore, ProcessSupervisor};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Licence shown from the tray menu
pub const LICENSE_URL: &str = "https://github.com/leapbtw/uxplay-windows/blob/main/LICENSE.md";

pub struct Orchestrator {
    supervisor: Arc<ProcessSupervisor>,
    autostart: AutostartRegistrar,
    /// Dropping the sender cancels a pending initial start
    initial_start: Mutex<Option<Sender<()>>>,
}

impl Orchestrator {
    pub fn new(supervisor: ProcessSupervisor, autostart: AutostartRegistrar) -> Self {
        Self {
            supervisor: Arc::new(supervisor),
            autostart,
            initial_start: Mutex::new(None),
        }
    }

    /// Wire up the components described by the configuration
    pub fn from_config(config: &LauncherConfig, paths: &Paths) -> Result<Self> {
        let arguments = ArgumentStore::new(&paths.arguments_file);
        let mut supervisor = ProcessSupervisor::new(&paths.server_exe, arguments)
            .with_stop_timeout(config.stop_timeout());

        if config.service.enabled {
            supervisor = supervisor.with_service(ServiceDependency::new(
                &config.service.name,
                service::platform_control(),
                config.service.poll_policy(),
            ));
        }

        let autostart = AutostartRegistrar::for_current_exe(&config.app_name)?;
        Ok(Self::new(supervisor, autostart))
    }

    pub fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }

    pub fn arguments(&self) -> &ArgumentStore {
        self.supervisor.arguments()
    }

    pub fn autostart(&self) -> &AutostartRegistrar {
        &self.autostart
    }

    /// One-time setup before the tray appears
    pub fn prepare(&self) {
        self.arguments().ensure_exists();
    }

    /// Start the server after `delay` on a background thread
    ///
    /// Skipped if `exit` is called before the delay elapses.
    pub fn schedule_initial_start(&self, delay: Duration) -> JoinHandle<()> {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        *self.initial_start.lock() = Some(cancel_tx);

        let supervisor = self.supervisor.clone();
        thread::spawn(move || match cancel_rx.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {
                info!("Initial start after {:?}", delay);
                start_supervised(&supervisor);
            }
            _ => info!("Initial start cancelled"),
        })
    }

    /// Start the server; true if it is running afterwards
    pub fn start(&self) -> bool {
        start_supervised(&self.supervisor)
    }

    pub fn stop(&self) {
        self.supervisor.stop();
    }

    /// Stop then start; true if it is running afterwards
    pub fn restart(&self) -> bool {
        info!("Restarting server...");
        self.supervisor.stop();
        start_supervised(&self.supervisor)
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// Queried fresh on every call so out-of-band edits show up
    pub fn autostart_enabled(&self) -> bool {
        self.autostart.is_enabled()
    }

    /// Returns whether autostart is enabled afterwards
    pub fn toggle_autostart(&self) -> bool {
        self.autostart.toggle()
    }

    /// Open the argument file in the user's default editor
    pub fn edit_arguments(&self) {
        let arguments = self.arguments();
        arguments.ensure_exists();
        match open::that(arguments.path()) {
            Ok(()) => info!("Opened arguments file {:?}", arguments.path()),
            Err(e) => error!("Failed to open arguments file: {}", e),
        }
    }

    pub fn open_license(&self) {
        if let Err(e) = open::that(LICENSE_URL) {
            error!("Failed to open license page: {}", e);
        }
    }

    /// Cancel any pending start and stop the server
    ///
    /// Later starts are refused, including a delayed start whose timer has
    /// already fired.
    pub fn exit(&self) {
        info!("Exiting application...");
        self.initial_start.lock().take();
        self.supervisor.shutdown();
    }

    pub fn is_exiting(&self) -> bool {
        self.supervisor.is_shut_down()
    }
}

fn start_supervised(supervisor: &ProcessSupervisor) -> bool {
    match supervisor.start() {
        Ok(outcome) => {
            debug!("Start outcome: {:?}", outcome);
            true
        }
        // Already logged by the supervisor
        Err(_) => false,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::autostart::XdgAutostartStore;
    use std::path::{Path, PathBuf};
    use std::time::Instant;
    use tempfile::TempDir;

    fn sleep_exe() -> PathBuf {
        ["/bin/sleep", "/usr/bin/sleep"]
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .expect("sleep not found")
    }

    fn orchestrator(dir: &TempDir, exe: &Path) -> Orchestrator {
        let arguments = ArgumentStore::new(dir.path().join("data").join("arguments.txt"));
        let supervisor = ProcessSupervisor::new(exe, arguments);
        let autostart = AutostartRegistrar::new(
            "uxplay-windows",
            "\"/opt/uxplay/uxplay-tray\"",
            Box::new(XdgAutostartStore::new(dir.path().join("autostart"))),
        );
        Orchestrator::new(supervisor, autostart)
    }

    #[test]
    fn test_prepare_creates_argument_file() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, &sleep_exe());

        orch.prepare();
        assert!(orch.arguments().path().exists());
    }

    #[test]
    fn test_delayed_initial_start() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, &sleep_exe());
        orch.prepare();
        std::fs::write(orch.arguments().path(), "30").unwrap();

        let began = Instant::now();
        orch.schedule_initial_start(Duration::from_millis(100))
            .join()
            .unwrap();
        assert!(began.elapsed() >= Duration::from_millis(100));
        assert!(orch.is_running());

        orch.exit();
        assert!(!orch.is_running());
        assert!(orch.is_exiting());
    }

    #[test]
    fn test_exit_cancels_initial_start() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, &sleep_exe());
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(orch.arguments().path(), "30").unwrap();

        let handle = orch.schedule_initial_start(Duration::from_secs(30));
        orch.exit();
        handle.join().unwrap();
        assert!(!orch.is_running());
    }

    #[test]
    fn test_no_start_after_exit() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, &sleep_exe());
        orch.prepare();
        std::fs::write(orch.arguments().path(), "30").unwrap();

        orch.exit();
        assert!(!orch.start());
        assert!(!orch.restart());
        orch.schedule_initial_start(Duration::from_millis(10))
            .join()
            .unwrap();
        assert!(!orch.is_running());
        assert!(orch.is_exiting());
    }

    #[test]
    fn test_start_and_restart() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, &sleep_exe());
        orch.prepare();
        std::fs::write(orch.arguments().path(), "30").unwrap();

        assert!(orch.restart());
        assert!(orch.start());
        let pid = orch.supervisor().pid().unwrap();
        assert!(orch.restart());
        assert_ne!(orch.supervisor().pid().unwrap(), pid);

        orch.stop();
        assert!(!orch.is_running());
    }

    #[test]
    fn test_missing_executable_is_contained() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, &dir.path().join("bin").join("uxplay"));

        assert!(!orch.start());
        assert!(!orch.restart());
        orch.stop();
        assert!(!orch.is_running());
    }

    #[test]
    fn test_toggle_autostart() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, &sleep_exe());

        let before = orch.autostart_enabled();
        assert_eq!(orch.toggle_autostart(), !before);
        assert_eq!(orch.toggle_autostart(), before);
    }

    #[test]
    fn test_from_config_without_service() {
        let dir = TempDir::new().unwrap();
        let config = LauncherConfig {
            arguments_file: dir.path().join("arguments.txt").to_string_lossy().to_string(),
            executable: sleep_exe().to_string_lossy().to_string(),
            ..LauncherConfig::default()
        };
        let paths = Paths::resolve(&config);

        let orch = Orchestrator::from_config(&config, &paths).unwrap();
        assert!(orch.supervisor().service().is_none());
        assert_eq!(orch.supervisor().executable(), sleep_exe().as_path());
        assert!(orch.autostart().command().starts_with('"'));
    }
}
