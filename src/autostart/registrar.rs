//! Enable/disable/toggle of the autostart entry

use crate::autostart::{launcher_command, platform_store, AutostartStore};
use crate::error::Result;
use tracing::{error, info};

/// Manages the autostart entry for one application name
///
/// The entry counts as enabled when its stored value contains the
/// expected command, so quoting normalised by the OS still matches.
pub struct AutostartRegistrar {
    app_name: String,
    command: String,
    store: Box<dyn AutostartStore>,
}

impl AutostartRegistrar {
    pub fn new(
        app_name: impl Into<String>,
        command: impl Into<String>,
        store: Box<dyn AutostartStore>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            command: command.into(),
            store,
        }
    }

    /// Registrar relaunching the running executable, using the platform store
    pub fn for_current_exe(app_name: impl Into<String>) -> Result<Self> {
        Ok(Self::new(app_name, launcher_command()?, platform_store()))
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Command written to the entry when enabling
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_enabled(&self) -> bool {
        match self.store.read(&self.app_name) {
            Ok(Some(value)) => value.contains(&self.command),
            Ok(None) => false,
            Err(e) => {
                error!("Failed to check autostart: {}", e);
                false
            }
        }
    }

    pub fn enable(&self) -> bool {
        match self.store.write(&self.app_name, &self.command) {
            Ok(()) => {
                info!("Autostart enabled");
                true
            }
            Err(e) => {
                error!("Failed to enable autostart: {}", e);
                false
            }
        }
    }

    pub fn disable(&self) -> bool {
        match self.store.remove(&self.app_name) {
            Ok(true) => {
                info!("Autostart disabled");
                true
            }
            Ok(false) => {
                info!("Autostart entry not found");
                true
            }
            Err(e) => {
                error!("Failed to disable autostart: {}", e);
                false
            }
        }
    }

    /// Flip the current state; returns whether autostart is now enabled
    pub fn toggle(&self) -> bool {
        if self.is_enabled() {
            self.disable();
        } else {
            self.enable();
        }
        self.is_enabled()
    }
}

impl std::fmt::Debug for AutostartRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutostartRegistrar")
            .field("app_name", &self.app_name)
            .field("command", &self.command)
            .finish()
    }
}
