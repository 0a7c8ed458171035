//! Launch-at-login registration for the launcher itself

mod registrar;
#[cfg(windows)]
mod registry;
#[cfg(not(windows))]
mod xdg;

pub use registrar::AutostartRegistrar;
#[cfg(windows)]
pub use registry::RunKeyStore;
#[cfg(not(windows))]
pub use xdg::XdgAutostartStore;

use crate::error::Result;

/// Persistent name → command storage used for autostart
pub trait AutostartStore: Send + Sync {
    /// Stored command for `name`, `None` if there is no entry
    fn read(&self, name: &str) -> Result<Option<String>>;

    /// Create or overwrite the entry
    fn write(&self, name: &str, command: &str) -> Result<()>;

    /// Delete the entry; `Ok(false)` if there was none
    fn remove(&self, name: &str) -> Result<bool>;
}

/// Command line that relaunches the current executable
pub fn launcher_command() -> Result<String> {
    let exe = std::env::current_exe()?;
    Ok(format!("\"{}\"", exe.display()))
}

/// Autostart storage for the current platform
pub fn platform_store() -> Box<dyn AutostartStore> {
    #[cfg(windows)]
    {
        Box::new(RunKeyStore)
    }
    #[cfg(not(windows))]
    {
        Box::new(XdgAutostartStore::default())
    }
}
