//! Auxiliary OS service the server depends on for discovery
//!
//! The server works without it, but clients will not find it on the
//! network. All control here is best-effort: failures are reported as
//! `false` and logged, never propagated to the supervisor.

mod dependency;
#[cfg(test)]
pub(crate) mod fake;
#[cfg(all(windows, feature = "service"))]
mod scm;

pub use dependency::{PollPolicy, ServiceDependency};
#[cfg(all(windows, feature = "service"))]
pub use scm::ScmControl;

use crate::error::{LauncherError, Result};

/// Observed state of an OS service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// No service with that name is installed
    NotPresent,
    Stopped,
    Running,
    /// Start or stop pending
    Transitioning,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ServiceState::NotPresent => "not installed",
            ServiceState::Stopped => "stopped",
            ServiceState::Running => "running",
            ServiceState::Transitioning => "transitioning",
        };
        f.write_str(text)
    }
}

/// Query/start/stop capability for a named service
///
/// `start` and `stop` only issue the request; confirmation is done by
/// polling `query`.
pub trait ServiceControl: Send + Sync {
    fn query(&self, name: &str) -> Result<ServiceState>;
    fn start(&self, name: &str) -> Result<()>;
    fn stop(&self, name: &str) -> Result<()>;
}

/// Stand-in for platforms without a service manager
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopControl;

impl ServiceControl for NoopControl {
    fn query(&self, _name: &str) -> Result<ServiceState> {
        Ok(ServiceState::NotPresent)
    }

    fn start(&self, name: &str) -> Result<()> {
        Err(LauncherError::service(name, "service control not available on this platform"))
    }

    fn stop(&self, name: &str) -> Result<()> {
        Err(LauncherError::service(name, "service control not available on this platform"))
    }
}

/// Service control backend for the current platform
pub fn platform_control() -> Box<dyn ServiceControl> {
    #[cfg(all(windows, feature = "service"))]
    {
        Box::new(ScmControl)
    }
    #[cfg(not(all(windows, feature = "service")))]
    {
        Box::new(NoopControl)
    }
}
