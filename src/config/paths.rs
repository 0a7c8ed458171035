//! Filesystem locations used by the launcher

use crate::config::LauncherConfig;
use std::path::PathBuf;

/// Directory name under the per-user data directory
pub const APP_DIR_NAME: &str = "uxplay-windows";

/// Resolved locations of bundled resources and per-user files
#[derive(Debug, Clone)]
pub struct Paths {
    /// Directory holding the launcher executable and bundled resources
    pub base_dir: PathBuf,
    /// Per-user data directory (%APPDATA%\uxplay-windows)
    pub data_dir: PathBuf,
    pub arguments_file: PathBuf,
    pub icon_file: PathBuf,
    pub server_exe: PathBuf,
    pub log_file: PathBuf,
}

impl Paths {
    /// Resolve paths, honouring overrides from the configuration
    pub fn resolve(config: &LauncherConfig) -> Self {
        Self::with_dirs(config, Self::default_base_dir(), Self::default_data_dir())
    }

    fn with_dirs(config: &LauncherConfig, base_dir: PathBuf, data_dir: PathBuf) -> Self {
        let server_exe = if config.executable.is_empty() {
            base_dir
                .join("bin")
                .join(format!("uxplay{}", std::env::consts::EXE_SUFFIX))
        } else {
            PathBuf::from(&config.executable)
        };

        let arguments_file = if config.arguments_file.is_empty() {
            data_dir.join("arguments.txt")
        } else {
            PathBuf::from(&config.arguments_file)
        };

        let log_file = if config.log_file.is_empty() {
            data_dir.join(format!("{}.log", APP_DIR_NAME))
        } else {
            PathBuf::from(&config.log_file)
        };

        Self {
            icon_file: base_dir.join("icon.ico"),
            base_dir,
            data_dir,
            arguments_file,
            server_exe,
            log_file,
        }
    }

    /// Executable directory, falling back to the working directory
    pub fn default_base_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }
}
