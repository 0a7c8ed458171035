//! uxplay-tray - UxPlay launcher
//!
//! Supervises the UxPlay AirPlay server from the notification area:
//! start/stop/restart, persisted server arguments, launch at login.

pub mod autostart;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod service;
pub mod supervisor;
pub mod tray;

pub use error::{LauncherError, Result};
pub use orchestrator::Orchestrator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
