//! Command line, configuration file and path resolution

mod args;
mod paths;
mod settings;

pub use args::{Args, AutostartAction, Command, ConfigAction, ServiceAction};
pub use paths::{Paths, APP_DIR_NAME};
pub use settings::{ConfigError, LauncherConfig, ServiceSettings, CONFIG_FILE_NAME};
