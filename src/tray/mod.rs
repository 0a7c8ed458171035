//! System tray front end for the launcher
//!
//! The controller runs menu commands against the orchestrator on a
//! background thread. The icon, menu and event loop are Windows only.

mod controller;

#[cfg(all(windows, feature = "tray"))]
mod app;
#[cfg(all(windows, feature = "tray"))]
mod icon;
#[cfg(all(windows, feature = "tray"))]
mod menu;

#[cfg(all(windows, feature = "tray"))]
pub use app::{TrayApp, TrayConfig};
pub use controller::{ControllerStatus, SupervisorController, TrayCommand};
