//! Persisted, user-editable server arguments

use crate::error::{LauncherError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Text file holding the server's command-line arguments
///
/// The file is plain text with shell-style quoting, so
/// `--name "Living Room"` yields two arguments.
#[derive(Debug, Clone)]
pub struct ArgumentStore {
    path: PathBuf,
}

impl ArgumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file (and its directory) empty if it does not exist
    ///
    /// Errors are logged; the launcher keeps working without the file.
    pub fn ensure_exists(&self) {
        if let Err(e) = self.try_ensure_exists() {
            error!("Failed to create arguments file {:?}: {}", self.path, e);
        }
    }

    fn try_ensure_exists(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                info!("Creating data directory {:?}", parent);
                fs::create_dir_all(parent)?;
            }
        }
        if !self.path.exists() {
            info!("Creating empty arguments file at {:?}", self.path);
            fs::write(&self.path, "")?;
        }
        Ok(())
    }

    /// Read and tokenize the argument file
    ///
    /// Never fails: a missing, empty, unreadable or badly quoted file
    /// yields no arguments.
    pub fn read_arguments(&self) -> Vec<String> {
        if !self.path.exists() {
            warn!("Arguments file {:?} not found, using no arguments", self.path);
            return Vec::new();
        }

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read arguments file {:?}: {}", self.path, e);
                return Vec::new();
            }
        };

        match parse_arguments(&text) {
            Ok(args) => args,
            Err(e) => {
                error!("{}", e);
                Vec::new()
            }
        }
    }
}

/// Split argument text into words using shell quoting rules
pub fn parse_arguments(text: &str) -> Result<Vec<String>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    shell_words::split(text).map_err(|e| LauncherError::ArgumentParse(e.to_string()))
}
