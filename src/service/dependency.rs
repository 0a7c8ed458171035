//! Poll-confirmed start/stop of the auxiliary service

use crate::service::{ServiceControl, ServiceState};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often and how long to poll for a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_secs(1),
        }
    }
}

/// A named service plus the backend used to control it
pub struct ServiceDependency {
    name: String,
    control: Box<dyn ServiceControl>,
    policy: PollPolicy,
}

impl ServiceDependency {
    pub fn new(name: impl Into<String>, control: Box<dyn ServiceControl>, policy: PollPolicy) -> Self {
        Self {
            name: name.into(),
            control,
            policy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state; query failures are reported as `NotPresent`
    pub fn state(&self) -> ServiceState {
        match self.control.query(&self.name) {
            Ok(state) => state,
            Err(e) => {
                debug!("Status query for '{}' failed: {}", self.name, e);
                ServiceState::NotPresent
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServiceState::Running
    }

    /// Start the service and wait until it reports running
    ///
    /// Returns `false` if the start request fails or the service is not
    /// running after the poll budget is spent.
    pub fn start(&self) -> bool {
        if self.is_running() {
            debug!("Service '{}' already running", self.name);
            return true;
        }

        info!("Starting service '{}'", self.name);
        if let Err(e) = self.control.start(&self.name) {
            warn!("Failed to start service '{}': {}", self.name, e);
            return false;
        }

        if self.wait_until(true) {
            info!("Service '{}' running", self.name);
            true
        } else {
            warn!(
                "Service '{}' not running after {} checks",
                self.name, self.policy.attempts
            );
            false
        }
    }

    /// Stop the service and wait until it no longer reports running
    pub fn stop(&self) -> bool {
        if !self.is_running() {
            debug!("Service '{}' already stopped", self.name);
            return true;
        }

        info!("Stopping service '{}'", self.name);
        if let Err(e) = self.control.stop(&self.name) {
            warn!("Failed to stop service '{}': {}", self.name, e);
            return false;
        }

        if self.wait_until(false) {
            info!("Service '{}' stopped", self.name);
            true
        } else {
            warn!(
                "Service '{}' still running after {} checks",
                self.name, self.policy.attempts
            );
            false
        }
    }

    fn wait_until(&self, running: bool) -> bool {
        for attempt in 1..=self.policy.attempts {
            std::thread::sleep(self.policy.interval);
            if self.is_running() == running {
                debug!("Service '{}' settled after {} checks", self.name, attempt);
                return true;
            }
        }
        false
    }
}

impl std::fmt::Debug for ServiceDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDependency")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fake::{fast_policy, FakeControl};
    use crate::service::NoopControl;
    use std::sync::atomic::Ordering;

    fn dependency(fake: &FakeControl) -> ServiceDependency {
        ServiceDependency::new("Bonjour Service", Box::new(fake.clone()), fast_policy())
    }

    #[test]
    fn test_query_failure_is_not_running() {
        let fake = FakeControl::default();
        let dep = dependency(&fake);
        assert_eq!(dep.state(), ServiceState::NotPresent);
        assert!(!dep.is_running());
    }

    #[test]
    fn test_start_when_running_is_noop() {
        let fake = FakeControl::with_state(ServiceState::Running);
        let dep = dependency(&fake);
        assert!(dep.start());
        assert_eq!(fake.starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_start_waits_for_running() {
        let fake = FakeControl::with_state(ServiceState::Stopped);
        fake.settle_after.store(3, Ordering::SeqCst);
        let dep = dependency(&fake);

        assert!(dep.start());
        assert_eq!(fake.starts.load(Ordering::SeqCst), 1);
        assert!(dep.is_running());
    }

    #[test]
    fn test_start_gives_up_after_budget() {
        let fake = FakeControl::with_state(ServiceState::Stopped);
        *fake.never_settles.lock() = true;
        let dep = dependency(&fake);

        assert!(!dep.start());
        assert_eq!(fake.starts.load(Ordering::SeqCst), 1);
        assert_eq!(dep.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_start_rejected_returns_immediately() {
        let fake = FakeControl::with_state(ServiceState::Stopped);
        *fake.reject_commands.lock() = true;
        let dep = ServiceDependency::new(
            "Bonjour Service",
            Box::new(fake.clone()),
            PollPolicy {
                attempts: 10,
                interval: Duration::from_secs(5),
            },
        );

        let started = std::time::Instant::now();
        assert!(!dep.start());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_stop_is_symmetric() {
        let fake = FakeControl::with_state(ServiceState::Running);
        fake.settle_after.store(1, Ordering::SeqCst);
        let dep = dependency(&fake);

        assert!(dep.stop());
        assert_eq!(fake.stops.load(Ordering::SeqCst), 1);
        assert!(dep.stop());
        assert_eq!(fake.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_timeout() {
        let fake = FakeControl::with_state(ServiceState::Running);
        *fake.never_settles.lock() = true;
        let dep = dependency(&fake);
        assert!(!dep.stop());
    }

    #[test]
    fn test_noop_control() {
        let dep = ServiceDependency::new("Bonjour Service", Box::new(NoopControl), fast_policy());
        assert!(!dep.is_running());
        assert!(!dep.start());
        assert!(dep.stop());
    }
}
