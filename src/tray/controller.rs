//! Bridge between the tray UI and the orchestrator

use crate::orchestrator::Orchestrator;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::info;

/// Commands sent from UI to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    /// Start the server
    Start,
    /// Stop the server
    Stop,
    /// Stop then start the server
    Restart,
    /// Flip launch-at-login
    ToggleAutostart,
    /// Open the argument file in the default editor
    EditArguments,
    /// Open the licence in the default browser
    OpenLicense,
    /// Stop the server and end the controller
    Shutdown,
}

/// Status updates sent from the controller to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerStatus {
    /// Server running state after a command
    ServerStateChanged(bool),
    /// Autostart state after a toggle
    AutostartChanged(bool),
    /// Start was requested but the server is not running
    Error(String),
    /// Server stopped, UI may exit
    ShutdownComplete,
}

/// Runs menu actions one at a time on a background thread
pub struct SupervisorController;

impl SupervisorController {
    /// Start the controller on a background thread
    pub fn start(
        orchestrator: Arc<Orchestrator>,
        command_rx: Receiver<TrayCommand>,
        status_tx: Sender<ControllerStatus>,
    ) -> JoinHandle<()> {
        thread::spawn(move || Self::run_loop(&orchestrator, command_rx, status_tx))
    }

    fn run_loop(
        orchestrator: &Orchestrator,
        command_rx: Receiver<TrayCommand>,
        status_tx: Sender<ControllerStatus>,
    ) {
        for command in command_rx.iter() {
            if !Self::handle_command(command, orchestrator, &status_tx) {
                return;
            }
        }

        // UI went away without a Shutdown
        info!("Command channel disconnected");
        orchestrator.exit();
    }

    fn handle_command(
        command: TrayCommand,
        orchestrator: &Orchestrator,
        status_tx: &Sender<ControllerStatus>,
    ) -> bool {
        match command {
            TrayCommand::Start => {
                let running = orchestrator.start();
                Self::report_server(running, true, status_tx);
            }
            TrayCommand::Stop => {
                orchestrator.stop();
                Self::report_server(orchestrator.is_running(), false, status_tx);
            }
            TrayCommand::Restart => {
                let running = orchestrator.restart();
                Self::report_server(running, true, status_tx);
            }
            TrayCommand::ToggleAutostart => {
                let enabled = orchestrator.toggle_autostart();
                let _ = status_tx.send(ControllerStatus::AutostartChanged(enabled));
            }
            TrayCommand::EditArguments => orchestrator.edit_arguments(),
            TrayCommand::OpenLicense => orchestrator.open_license(),
            TrayCommand::Shutdown => {
                orchestrator.exit();
                let _ = status_tx.send(ControllerStatus::ServerStateChanged(false));
                let _ = status_tx.send(ControllerStatus::ShutdownComplete);
                return false; // Signal to exit loop
            }
        }
        true
    }

    fn report_server(running: bool, wanted: bool, status_tx: &Sender<ControllerStatus>) {
        let _ = status_tx.send(ControllerStatus::ServerStateChanged(running));
        if wanted && !running {
            let _ = status_tx.send(ControllerStatus::Error(
                "UxPlay could not be started, see the log for details".to_string(),
            ));
        }
    }
}
