//! XDG autostart desktop entries (~/.config/autostart)

use crate::autostart::AutostartStore;
use crate::error::{LauncherError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores each entry as `<dir>/<name>.desktop` with the command in `Exec=`
#[derive(Debug, Clone)]
pub struct XdgAutostartStore {
    dir: PathBuf,
}

impl Default for XdgAutostartStore {
    fn default() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("autostart");
        Self::new(dir)
    }
}

impl XdgAutostartStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.desktop", name))
    }
}

fn access_error(action: &str, path: &Path, e: std::io::Error) -> LauncherError {
    LauncherError::RegistryAccess(format!("{} {:?}: {}", action, path, e))
}

impl AutostartStore for XdgAutostartStore {
    fn read(&self, name: &str) -> Result<Option<String>> {
        let path = self.entry_path(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(access_error("read", &path, e)),
        };

        Ok(content
            .lines()
            .find_map(|line| line.trim().strip_prefix("Exec="))
            .map(|exec| exec.to_string()))
    }

    fn write(&self, name: &str, command: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| access_error("create", &self.dir, e))?;

        let path = self.entry_path(name);
        let content = format!(
            "[Desktop Entry]\nType=Application\nName={}\nExec={}\nX-GNOME-Autostart-enabled=true\n",
            name, command
        );
        fs::write(&path, content).map_err(|e| access_error("write", &path, e))
    }

    fn remove(&self, name: &str) -> Result<bool> {
        let path = self.entry_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(access_error("remove", &path, e)),
        }
    }
}
