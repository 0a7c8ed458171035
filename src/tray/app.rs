//! Main tray application

use crate::orchestrator::Orchestrator;
use crate::tray::controller::{ControllerStatus, SupervisorController, TrayCommand};
use crate::tray::icon::IconManager;
use crate::tray::menu::{MenuAction, MenuManager};
use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use muda::MenuEvent;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tray_icon::{MouseButton, TrayIcon, TrayIconBuilder, TrayIconEvent};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
};

/// Upper bound on waiting for the server to stop when exiting
const SHUTDOWN_WAIT: Duration = Duration::from_secs(30);

/// Configuration for tray application
#[derive(Debug, Clone)]
pub struct TrayConfig {
    /// Tooltip shown when hovering the icon
    pub tooltip: String,
    /// Icon file; a built-in icon is used if it cannot be loaded
    pub icon_path: PathBuf,
    /// Start the server automatically after `startup_delay`
    pub auto_start: bool,
    pub startup_delay: Duration,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            tooltip: "uxplay-windows".to_string(),
            icon_path: PathBuf::from("icon.ico"),
            auto_start: true,
            startup_delay: Duration::from_secs(3),
        }
    }
}

/// Main tray application
pub struct TrayApp {
    config: TrayConfig,
    orchestrator: Arc<Orchestrator>,
    tray_icon: Option<TrayIcon>,
    menu_manager: MenuManager,
    icon_manager: IconManager,
    command_tx: Sender<TrayCommand>,
    status_rx: Receiver<ControllerStatus>,
}

impl TrayApp {
    /// Create a new tray application
    pub fn new(config: TrayConfig, orchestrator: Orchestrator) -> Result<Self> {
        let orchestrator = Arc::new(orchestrator);
        let (command_tx, command_rx) = bounded(64);
        let (status_tx, status_rx) = bounded(64);

        // Menu actions run one at a time on the controller thread
        SupervisorController::start(orchestrator.clone(), command_rx, status_tx);

        let icon_manager = IconManager::new(&config.icon_path)?;
        let menu_manager = MenuManager::new();

        Ok(Self {
            config,
            orchestrator,
            tray_icon: None,
            menu_manager,
            icon_manager,
            command_tx,
            status_rx,
        })
    }

    /// Run the tray application
    pub fn run(&mut self) -> Result<()> {
        self.orchestrator.prepare();

        let menu = self.menu_manager.build_menu()?;
        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(&self.config.tooltip)
            .with_icon(self.icon_manager.stopped_icon())
            .build()?;

        self.tray_icon = Some(tray_icon);
        self.refresh_state()?;

        // Delayed so the icon shows up before the server launches
        if self.config.auto_start {
            self.orchestrator
                .schedule_initial_start(self.config.startup_delay);
        }

        info!("Launching tray icon");
        self.run_event_loop()?;
        info!("Tray exited, application stopping");
        Ok(())
    }

    fn run_event_loop(&mut self) -> Result<()> {
        // Windows message loop - required for tray icon and menu to work
        loop {
            unsafe {
                let mut msg: MSG = std::mem::zeroed();

                // Process all pending Windows messages (non-blocking)
                while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }

            // Process tray icon events
            if let Ok(event) = TrayIconEvent::receiver().try_recv() {
                if let Err(e) = self.handle_tray_event(event) {
                    error!("Error handling tray event: {}", e);
                }
            }

            // Process menu events
            if let Ok(event) = MenuEvent::receiver().try_recv() {
                match self.handle_menu_event(event) {
                    Ok(true) => {}
                    Ok(false) => return Ok(()),
                    Err(e) => error!("Error handling menu event: {}", e),
                }
            }

            // Process status updates from the controller
            while let Ok(status) = self.status_rx.try_recv() {
                if let Err(e) = self.handle_status_update(status) {
                    error!("Error handling status update: {}", e);
                }
            }

            // Small sleep to avoid busy-waiting
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn handle_tray_event(&mut self, event: TrayIconEvent) -> Result<()> {
        match event {
            // Hovering or clicking precedes the menu; re-read state so the
            // checkmark reflects out-of-band registry edits.
            TrayIconEvent::Enter { .. }
            | TrayIconEvent::Click {
                button: MouseButton::Right,
                ..
            } => self.refresh_state()?,
            TrayIconEvent::DoubleClick { .. } => {
                info!("Tray icon double clicked");
                self.command_tx.send(TrayCommand::Restart)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns false when the application should exit
    fn handle_menu_event(&mut self, event: MenuEvent) -> Result<bool> {
        let Some(action) = self.menu_manager.get_action(event.id()) else {
            return Ok(true);
        };

        let command = match action {
            MenuAction::Start => TrayCommand::Start,
            MenuAction::Stop => TrayCommand::Stop,
            MenuAction::Restart => TrayCommand::Restart,
            MenuAction::ToggleAutostart => TrayCommand::ToggleAutostart,
            MenuAction::EditArguments => TrayCommand::EditArguments,
            MenuAction::License => TrayCommand::OpenLicense,
            MenuAction::Exit => {
                self.shutdown()?;
                return Ok(false);
            }
        };

        info!("Menu action: {:?}", command);
        self.command_tx.send(command)?;
        Ok(true)
    }

    /// Stop the server before the icon goes away
    fn shutdown(&mut self) -> Result<()> {
        info!("Exit application");
        self.command_tx.send(TrayCommand::Shutdown)?;

        let deadline = std::time::Instant::now() + SHUTDOWN_WAIT;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.status_rx.recv_timeout(remaining) {
                Ok(ControllerStatus::ShutdownComplete) => break,
                Ok(_) => continue,
                Err(_) => {
                    error!("Timed out waiting for the server to stop");
                    break;
                }
            }
        }

        self.tray_icon.take();
        Ok(())
    }

    fn handle_status_update(&mut self, status: ControllerStatus) -> Result<()> {
        match status {
            ControllerStatus::ServerStateChanged(running) => {
                info!("Server running: {}", running);
                self.show_server_state(running)?;
            }
            ControllerStatus::AutostartChanged(enabled) => {
                self.menu_manager.update_autostart(enabled);
            }
            ControllerStatus::Error(msg) => {
                error!("{}", msg);
                if let Some(ref tray) = self.tray_icon {
                    tray.set_tooltip(Some(format!("{} - {}", self.config.tooltip, msg)))?;
                }
            }
            ControllerStatus::ShutdownComplete => {}
        }

        Ok(())
    }

    fn refresh_state(&mut self) -> Result<()> {
        self.menu_manager
            .update_autostart(self.orchestrator.autostart_enabled());
        self.show_server_state(self.orchestrator.is_running())
    }

    fn show_server_state(&mut self, running: bool) -> Result<()> {
        self.menu_manager.update_server_state(running);

        let icon = if running {
            self.icon_manager.running_icon()
        } else {
            self.icon_manager.stopped_icon()
        };

        if let Some(ref tray) = self.tray_icon {
            tray.set_icon(Some(icon))?;
            if running {
                tray.set_tooltip(Some(&self.config.tooltip))?;
            }
        }
        Ok(())
    }
}
