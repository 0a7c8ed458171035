//! Lifecycle of the single supervised server process

use crate::error::{LauncherError, Result};
use crate::service::ServiceDependency;
use crate::supervisor::platform;
use crate::supervisor::ArgumentStore;
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default time a process gets to exit after a graceful request
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(3);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new process was launched
    Started(u32),
    /// The tracked process is still alive; nothing was launched
    AlreadyRunning(u32),
}

impl StartOutcome {
    pub fn pid(&self) -> u32 {
        match self {
            StartOutcome::Started(pid) | StartOutcome::AlreadyRunning(pid) => *pid,
        }
    }
}

/// How a stop request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running
    NotRunning,
    /// Exited after the graceful request
    Graceful,
    /// Killed after the graceful request timed out or failed
    Forced,
}

/// Owns at most one running instance of the server executable
///
/// `start` and `stop` are idempotent and serialized on `op`, so they can be
/// called from the menu thread and the delayed-start thread without
/// launching twice. The `child` slot is only locked briefly, so liveness
/// queries never wait on a service poll or a stop timeout.
pub struct ProcessSupervisor {
    executable: PathBuf,
    arguments: ArgumentStore,
    service: Option<ServiceDependency>,
    stop_timeout: Duration,
    op: Mutex<()>,
    child: Mutex<Option<Child>>,
    shut_down: AtomicBool,
}

impl ProcessSupervisor {
    pub fn new(executable: impl Into<PathBuf>, arguments: ArgumentStore) -> Self {
        Self {
            executable: executable.into(),
            arguments,
            service: None,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            op: Mutex::new(()),
            child: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Start/stop this service together with the process
    pub fn with_service(mut self, service: ServiceDependency) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arguments(&self) -> &ArgumentStore {
        &self.arguments
    }

    pub fn service(&self) -> Option<&ServiceDependency> {
        self.service.as_ref()
    }

    /// Whether the tracked process is still alive
    pub fn is_running(&self) -> bool {
        self.pid().is_some()
    }

    /// PID of the tracked process, if it is still alive
    pub fn pid(&self) -> Option<u32> {
        Self::live_pid(&mut self.child.lock())
    }

    /// Check liveness, clearing the slot if the process has exited
    fn live_pid(slot: &mut Option<Child>) -> Option<u32> {
        let child = slot.as_mut()?;
        match child.try_wait() {
            Ok(None) => return Some(child.id()),
            Ok(Some(status)) => info!("Server (PID {}) exited with {}", child.id(), status),
            Err(e) => warn!("Failed to poll server (PID {}): {}", child.id(), e),
        }
        *slot = None;
        None
    }

    /// Launch the server unless it is already running
    ///
    /// Refused with `ShuttingDown` once `shutdown` has been called.
    pub fn start(&self) -> Result<StartOutcome> {
        let _op = self.op.lock();

        if self.is_shut_down() {
            info!("Not starting server, launcher is shutting down");
            return Err(LauncherError::ShuttingDown);
        }

        if let Some(pid) = self.pid() {
            info!("Server already running (PID {})", pid);
            return Ok(StartOutcome::AlreadyRunning(pid));
        }

        if !self.executable.exists() {
            let err = LauncherError::ExecutableNotFound(self.executable.clone());
            error!("{}", err);
            return Err(err);
        }

        if let Some(service) = &self.service {
            if !service.start() {
                warn!(
                    "Service '{}' unavailable, starting server anyway; it may not be discoverable",
                    service.name()
                );
            }
        }

        let args = self.arguments.read_arguments();
        info!("Starting server: {:?} {:?}", self.executable, args);

        let mut command = Command::new(&self.executable);
        command.args(&args);
        platform::hide_console(&mut command);

        match command.spawn() {
            Ok(child) => {
                let pid = child.id();
                info!("Server started (PID {})", pid);
                *self.child.lock() = Some(child);
                Ok(StartOutcome::Started(pid))
            }
            Err(source) => {
                let err = LauncherError::LaunchFailed {
                    path: self.executable.clone(),
                    source,
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Stop the server, escalating to a kill if it ignores the request
    pub fn stop(&self) -> StopOutcome {
        let _op = self.op.lock();
        self.stop_locked()
    }

    /// Stop the server and refuse any later `start`
    ///
    /// A start already in progress finishes first and is then stopped.
    pub fn shutdown(&self) -> StopOutcome {
        let _op = self.op.lock();
        self.shut_down.store(true, Ordering::SeqCst);
        self.stop_locked()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    fn stop_locked(&self) -> StopOutcome {
        let child = {
            let mut slot = self.child.lock();
            if Self::live_pid(&mut slot).is_none() {
                None
            } else {
                slot.take()
            }
        };

        let Some(child) = child else {
            info!("Server is not running");
            return StopOutcome::NotRunning;
        };

        let outcome = Self::terminate(child, self.stop_timeout, platform::request_graceful_stop);

        if let Some(service) = &self.service {
            if !service.stop() {
                warn!("Service '{}' did not stop", service.name());
            }
        }

        outcome
    }

    /// Stop then start; not atomic
    pub fn restart(&self) -> Result<StartOutcome> {
        info!("Restarting server");
        self.stop();
        self.start()
    }

    fn terminate(
        mut child: Child,
        timeout: Duration,
        request_stop: fn(&Child) -> io::Result<()>,
    ) -> StopOutcome {
        let pid = child.id();
        info!("Stopping server (PID {})", pid);

        match request_stop(&child) {
            Ok(()) => {
                if Self::wait_timeout(&mut child, timeout) {
                    info!("Server stopped cleanly");
                    return StopOutcome::Graceful;
                }
                warn!("{}; killing PID {}", LauncherError::GracefulStopTimeout(timeout), pid);
            }
            Err(e) => warn!("Graceful stop failed: {}; killing PID {}", e, pid),
        }

        if let Err(e) = child.kill() {
            // Already gone between the last poll and the kill.
            debug!("Kill of PID {} failed: {}", pid, e);
        }
        match child.wait() {
            Ok(status) => info!("Server killed ({})", status),
            Err(e) => error!("Failed to reap server (PID {}): {}", pid, e),
        }
        StopOutcome::Forced
    }

    /// Poll for exit until `timeout`; true if the process exited
    fn wait_timeout(child: &mut Child, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(e) => {
                    warn!("Failed to poll server (PID {}): {}", child.id(), e);
                    return false;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(EXIT_POLL_INTERVAL);
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("executable", &self.executable)
            .field("service", &self.service)
            .field("stop_timeout", &self.stop_timeout)
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::service::fake::{fast_policy, FakeControl};
    use crate::service::{PollPolicy, ServiceState};
    use std::fs;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn which(name: &str) -> PathBuf {
        ["/bin", "/usr/bin"]
            .iter()
            .map(|dir| Path::new(dir).join(name))
            .find(|p| p.exists())
            .unwrap_or_else(|| panic!("{} not found", name))
    }

    fn supervisor(dir: &TempDir, exe: PathBuf, args: &str) -> ProcessSupervisor {
        let path = dir.path().join("arguments.txt");
        fs::write(&path, args).unwrap();
        ProcessSupervisor::new(exe, ArgumentStore::new(path))
            .with_stop_timeout(Duration::from_millis(500))
    }

    #[test]
    fn test_missing_executable() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, dir.path().join("bin").join("uxplay"), "");

        assert!(matches!(sup.start(), Err(LauncherError::ExecutableNotFound(_))));
        assert!(!sup.is_running());
        assert_eq!(sup.stop(), StopOutcome::NotRunning);
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, which("sleep"), "30");
        assert_eq!(sup.stop(), StopOutcome::NotRunning);
        assert_eq!(sup.stop(), StopOutcome::NotRunning);
    }

    #[test]
    fn test_start_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, which("sleep"), "30");

        let first = sup.start().unwrap();
        let second = sup.start().unwrap();
        assert!(matches!(first, StartOutcome::Started(_)));
        assert_eq!(second, StartOutcome::AlreadyRunning(first.pid()));
        assert_eq!(sup.pid(), Some(first.pid()));

        assert_eq!(sup.stop(), StopOutcome::Graceful);
        assert!(!sup.is_running());
    }

    #[test]
    fn test_concurrent_starts_launch_once() {
        let dir = TempDir::new().unwrap();
        let sup = Arc::new(supervisor(&dir, which("sleep"), "30"));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sup = sup.clone();
                thread::spawn(move || sup.start().unwrap())
            })
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let started = outcomes
            .iter()
            .filter(|o| matches!(o, StartOutcome::Started(_)))
            .count();
        assert_eq!(started, 1);
        sup.stop();
    }

    #[test]
    fn test_forced_stop_when_term_ignored() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, which("sh"), "-c \"trap '' TERM; sleep 5\"");

        sup.start().unwrap();
        // Let the shell install its trap.
        thread::sleep(Duration::from_millis(300));

        let began = Instant::now();
        assert_eq!(sup.stop(), StopOutcome::Forced);
        assert!(began.elapsed() >= Duration::from_millis(500));
        assert!(!sup.is_running());
        assert_eq!(sup.stop(), StopOutcome::NotRunning);
    }

    #[test]
    fn test_exited_process_is_noticed() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, which("true"), "");

        assert!(matches!(sup.start().unwrap(), StartOutcome::Started(_)));
        thread::sleep(Duration::from_millis(200));
        assert!(!sup.is_running());
        assert_eq!(sup.stop(), StopOutcome::NotRunning);

        // A fresh launch, not AlreadyRunning
        assert!(matches!(sup.start().unwrap(), StartOutcome::Started(_)));
    }

    #[test]
    fn test_arguments_read_on_every_start() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, which("sleep"), "30");
        sup.start().unwrap();
        sup.stop();

        fs::write(sup.arguments().path(), "not-a-number").unwrap();
        // sleep rejects the argument and exits immediately
        sup.start().unwrap();
        thread::sleep(Duration::from_millis(200));
        assert!(!sup.is_running());
    }

    #[test]
    fn test_restart_from_any_state() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, which("sleep"), "30");

        assert!(matches!(sup.restart().unwrap(), StartOutcome::Started(_)));
        let first = sup.pid().unwrap();

        assert!(matches!(sup.restart().unwrap(), StartOutcome::Started(_)));
        let second = sup.pid().unwrap();
        assert_ne!(first, second);

        sup.stop();
    }

    #[test]
    fn test_service_failure_does_not_block_start() {
        let dir = TempDir::new().unwrap();
        let fake = FakeControl::with_state(ServiceState::Stopped);
        *fake.never_settles.lock() = true;

        let sup = supervisor(&dir, which("sleep"), "30").with_service(ServiceDependency::new(
            "Bonjour Service",
            Box::new(fake.clone()),
            fast_policy(),
        ));

        assert!(matches!(sup.start().unwrap(), StartOutcome::Started(_)));
        assert_eq!(fake.starts.load(Ordering::SeqCst), 1);
        assert!(sup.is_running());
        sup.stop();
    }

    #[test]
    fn test_service_follows_process() {
        let dir = TempDir::new().unwrap();
        let fake = FakeControl::with_state(ServiceState::Stopped);

        let sup = supervisor(&dir, which("sleep"), "30").with_service(ServiceDependency::new(
            "Bonjour Service",
            Box::new(fake.clone()),
            fast_policy(),
        ));

        sup.start().unwrap();
        assert_eq!(sup.service().unwrap().state(), ServiceState::Running);

        sup.stop();
        assert_eq!(fake.stops.load(Ordering::SeqCst), 1);
        assert_eq!(sup.service().unwrap().state(), ServiceState::Stopped);
    }

    #[test]
    fn test_drop_stops_child() {
        let dir = TempDir::new().unwrap();
        let fake = FakeControl::with_state(ServiceState::Running);
        let sup = supervisor(&dir, which("sleep"), "30").with_service(ServiceDependency::new(
            "Bonjour Service",
            Box::new(fake.clone()),
            fast_policy(),
        ));

        sup.start().unwrap();
        drop(sup);
        assert_eq!(fake.stops.load(Ordering::SeqCst), 1);
    }

    fn slow_service(fake: &FakeControl) -> ServiceDependency {
        ServiceDependency::new(
            "Bonjour Service",
            Box::new(fake.clone()),
            PollPolicy {
                attempts: 10,
                interval: Duration::from_millis(100),
            },
        )
    }

    #[test]
    fn test_liveness_not_blocked_by_service_poll() {
        let dir = TempDir::new().unwrap();
        let fake = FakeControl::with_state(ServiceState::Stopped);
        *fake.never_settles.lock() = true;
        let sup = Arc::new(
            supervisor(&dir, which("sleep"), "30").with_service(slow_service(&fake)),
        );

        let starter = {
            let sup = sup.clone();
            thread::spawn(move || sup.start())
        };
        thread::sleep(Duration::from_millis(100));

        let began = Instant::now();
        assert!(!sup.is_running());
        assert!(began.elapsed() < Duration::from_millis(250));

        assert!(matches!(starter.join().unwrap(), Ok(StartOutcome::Started(_))));
        sup.stop();
    }

    #[test]
    fn test_failed_stop_request_still_kills() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, which("sleep"), "30");
        sup.start().unwrap();

        let child = sup.child.lock().take().unwrap();
        let outcome = ProcessSupervisor::terminate(child, Duration::from_millis(500), |_| {
            Err(io::Error::other("request rejected"))
        });

        assert_eq!(outcome, StopOutcome::Forced);
        assert!(!sup.is_running());
        assert_eq!(sup.stop(), StopOutcome::NotRunning);
    }

    #[test]
    fn test_process_killed_elsewhere() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, which("sleep"), "30");
        let pid = sup.start().unwrap().pid();

        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGKILL);
        }
        thread::sleep(Duration::from_millis(200));

        let outcome = sup.stop();
        assert!(matches!(outcome, StopOutcome::NotRunning | StopOutcome::Forced));
        assert!(!sup.is_running());
        assert_eq!(sup.stop(), StopOutcome::NotRunning);
    }

    #[test]
    fn test_shutdown_refuses_start() {
        let dir = TempDir::new().unwrap();
        let sup = supervisor(&dir, which("sleep"), "30");
        sup.start().unwrap();

        assert_eq!(sup.shutdown(), StopOutcome::Graceful);
        assert!(sup.is_shut_down());
        assert!(matches!(sup.start(), Err(LauncherError::ShuttingDown)));
        assert!(!sup.is_running());
    }

    #[test]
    fn test_shutdown_during_start_leaves_nothing_running() {
        let dir = TempDir::new().unwrap();
        let fake = FakeControl::with_state(ServiceState::Stopped);
        *fake.never_settles.lock() = true;
        let sup = Arc::new(
            supervisor(&dir, which("sleep"), "30").with_service(slow_service(&fake)),
        );

        let starter = {
            let sup = sup.clone();
            thread::spawn(move || sup.start())
        };
        thread::sleep(Duration::from_millis(100));

        sup.shutdown();
        assert!(!sup.is_running());
        assert!(matches!(
            starter.join().unwrap(),
            Ok(StartOutcome::Started(_)) | Err(LauncherError::ShuttingDown)
        ));
        assert!(!sup.is_running());
    }
}
