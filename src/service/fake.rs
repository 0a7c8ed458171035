//! Scriptable service backend for tests

use crate::error::{LauncherError, Result};
use crate::service::{PollPolicy, ServiceControl, ServiceState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scriptable service backend shared between test and dependency
#[derive(Clone, Default)]
pub struct FakeControl {
    pub state: Arc<Mutex<Option<ServiceState>>>,
    /// Queries after a start/stop request before the state flips
    pub settle_after: Arc<AtomicUsize>,
    pub pending: Arc<Mutex<Option<(ServiceState, usize)>>>,
    pub reject_commands: Arc<Mutex<bool>>,
    /// Start requests are accepted but the service never comes up
    pub never_settles: Arc<Mutex<bool>>,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

impl FakeControl {
    pub fn with_state(state: ServiceState) -> Self {
        let fake = Self::default();
        *fake.state.lock() = Some(state);
        fake
    }

    fn request(&self, name: &str, target: ServiceState) -> Result<()> {
        if *self.reject_commands.lock() {
            return Err(LauncherError::service(name, "access denied"));
        }
        if *self.never_settles.lock() {
            return Ok(());
        }
        let after = self.settle_after.load(Ordering::SeqCst);
        *self.pending.lock() = Some((target, after));
        *self.state.lock() = Some(ServiceState::Transitioning);
        Ok(())
    }
}

impl ServiceControl for FakeControl {
    fn query(&self, name: &str) -> Result<ServiceState> {
        let mut pending = self.pending.lock();
        if let Some((target, remaining)) = pending.as_mut() {
            if *remaining == 0 {
                *self.state.lock() = Some(*target);
                *pending = None;
            } else {
                *remaining -= 1;
            }
        }
        drop(pending);
        let state = *self.state.lock();
        state.ok_or_else(|| LauncherError::service(name, "query failed"))
    }

    fn start(&self, name: &str) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.request(name, ServiceState::Running)
    }

    fn stop(&self, name: &str) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.request(name, ServiceState::Stopped)
    }
}

pub fn fast_policy() -> PollPolicy {
    PollPolicy {
        attempts: 10,
        interval: Duration::from_millis(5),
    }
}
