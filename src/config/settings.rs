//! Launcher configuration file support

use crate::config::paths::APP_DIR_NAME;
use crate::service::PollPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up next to the launcher executable
pub const CONFIG_FILE_NAME: &str = "uxplay-tray.toml";

/// Launcher configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Name used for the autostart entry and the tray tooltip
    pub app_name: String,

    /// Server executable (empty = bin/uxplay.exe next to the launcher)
    pub executable: String,

    /// Argument file (empty = arguments.txt in the per-user data directory)
    pub arguments_file: String,

    /// Delay before the first automatic start, in seconds
    pub startup_delay_secs: u64,

    /// How long to wait for a graceful stop before killing, in seconds
    pub stop_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log file path (empty = uxplay-windows.log in the data directory)
    pub log_file: String,

    /// Auxiliary discovery service
    pub service: ServiceSettings,
}

/// Settings for the auxiliary OS service started alongside the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Start/stop the service together with the server
    pub enabled: bool,
    /// Service name as registered with the OS
    pub name: String,
    /// Number of status polls before giving up
    pub poll_attempts: u32,
    /// Delay between status polls, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            enabled: cfg!(windows),
            name: "Bonjour Service".to_string(),
            poll_attempts: 10,
            poll_interval_ms: 1000,
        }
    }
}

impl ServiceSettings {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            attempts: self.poll_attempts,
            interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            app_name: APP_DIR_NAME.to_string(),
            executable: String::new(),
            arguments_file: String::new(),
            startup_delay_secs: 3,
            stop_timeout_secs: 3,
            log_level: "info".to_string(),
            log_file: String::new(),
            service: ServiceSettings::default(),
        }
    }
}

impl LauncherConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. Same directory as executable: uxplay-tray.toml
    /// 2. %APPDATA%\uxplay-windows\config.toml
    pub fn load_default() -> Result<Self, ConfigError> {
        for candidate in Self::search_paths() {
            if candidate.exists() {
                return Self::load(&candidate);
            }
        }

        // Return default config if no file found
        Ok(Self::default())
    }

    /// Load from an explicit path if given, default locations otherwise
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                paths.push(exe_dir.join(CONFIG_FILE_NAME));
            }
        }
        if let Some(data_dir) = dirs::data_dir() {
            paths.push(data_dir.join(APP_DIR_NAME).join("config.toml"));
        }
        paths
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_string_lossy().to_string(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# uxplay-tray configuration
# Place next to uxplay-tray.exe as uxplay-tray.toml,
# or in %APPDATA%\uxplay-windows\config.toml

# Name of the autostart entry
app_name = "uxplay-windows"

# Server executable (empty = bin\uxplay.exe next to the launcher)
executable = ""

# Argument file (empty = %APPDATA%\uxplay-windows\arguments.txt)
arguments_file = ""

# Seconds to wait after launch before starting the server
startup_delay_secs = 3

# Seconds to wait for a graceful stop before killing the server
stop_timeout_secs = 3

# Log level: trace, debug, info, warn, error (default: info)
log_level = "info"

# Log file path (empty = %APPDATA%\uxplay-windows\uxplay-windows.log)
log_file = ""

[service]
# Start the discovery service before the server
enabled = true
name = "Bonjour Service"
poll_attempts = 10
poll_interval_ms = 1000
"#
        .to_string()
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading/writing config file
    Io {
        path: String,
        source: std::io::Error,
    },
    /// Error parsing TOML
    Parse {
        path: String,
        source: toml::de::Error,
    },
    /// Error serializing config
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to access config file '{}': {}", path, source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path, source)
            }
            ConfigError::Serialize(e) => write!(f, "Failed to serialize config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Serialize(e) => Some(e),
        }
    }
}
