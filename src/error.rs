//! Unified error types for uxplay-tray

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for launcher operations
#[derive(Error, Debug)]
pub enum LauncherError {
    /// Server executable missing on disk
    #[error("Executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    /// The OS refused to create the server process
    #[error("Failed to launch '{}': {source}", path.display())]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process did not honour graceful termination in time
    #[error("Process did not exit within {0:?} of graceful termination")]
    GracefulStopTimeout(Duration),

    /// Query/start/stop of the auxiliary service failed
    #[error("Service '{service}' control failed: {message}")]
    ServiceControlFailed { service: String, message: String },

    /// Argument file could not be tokenized
    #[error("Failed to parse arguments: {0}")]
    ArgumentParse(String),

    /// Autostart entry could not be read or written
    #[error("Autostart registry access failed: {0}")]
    RegistryAccess(String),

    /// Start refused because the launcher is exiting
    #[error("Launcher is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for launcher operations
pub type Result<T> = std::result::Result<T, LauncherError>;

impl LauncherError {
    /// Create a service control error with context
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ServiceControlFailed {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Errors the supervisor recovers from on its own
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LauncherError::GracefulStopTimeout(_)
                | LauncherError::ServiceControlFailed { .. }
                | LauncherError::ArgumentParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_path() {
        let err = LauncherError::ExecutableNotFound(PathBuf::from("bin/uxplay.exe"));
        assert!(err.to_string().contains("uxplay.exe"));
    }

    #[test]
    fn test_recoverable() {
        assert!(LauncherError::service("Bonjour Service", "timeout").is_recoverable());
        assert!(!LauncherError::ExecutableNotFound(PathBuf::new()).is_recoverable());
    }
}
