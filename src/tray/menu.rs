//! Menu management for tray application

use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem};
use std::collections::HashMap;

/// Menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    Stop,
    Restart,
    ToggleAutostart,
    EditArguments,
    License,
    Exit,
}

/// Menu manager for tray application
pub struct MenuManager {
    actions: HashMap<MenuId, MenuAction>,
    status_item: MenuItem,
    start_item: MenuItem,
    stop_item: MenuItem,
    restart_item: MenuItem,
    autostart_item: CheckMenuItem,
}

impl MenuManager {
    /// Create a new menu manager
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
            status_item: MenuItem::new("UxPlay: Stopped", false, None),
            start_item: MenuItem::new("Start UxPlay", true, None),
            stop_item: MenuItem::new("Stop UxPlay", false, None),
            restart_item: MenuItem::new("Restart UxPlay", true, None),
            autostart_item: CheckMenuItem::new("Autostart with Windows", true, false, None),
        }
    }

    /// Build the menu structure
    pub fn build_menu(&mut self) -> Result<Menu, muda::Error> {
        self.actions.clear();
        let menu = Menu::new();

        // Server state (non-clickable)
        menu.append(&self.status_item)?;
        menu.append(&PredefinedMenuItem::separator())?;

        Self::register(&mut self.actions, &menu, &self.start_item, MenuAction::Start)?;
        Self::register(&mut self.actions, &menu, &self.stop_item, MenuAction::Stop)?;
        Self::register(&mut self.actions, &menu, &self.restart_item, MenuAction::Restart)?;

        menu.append(&PredefinedMenuItem::separator())?;

        let autostart_id = self.autostart_item.id().clone();
        self.actions.insert(autostart_id, MenuAction::ToggleAutostart);
        menu.append(&self.autostart_item)?;

        let edit_item = MenuItem::new("Edit UxPlay Arguments", true, None);
        Self::register(&mut self.actions, &menu, &edit_item, MenuAction::EditArguments)?;

        let license_item = MenuItem::new("License", true, None);
        Self::register(&mut self.actions, &menu, &license_item, MenuAction::License)?;

        menu.append(&PredefinedMenuItem::separator())?;

        // Version info (non-clickable)
        let version_item = MenuItem::new(
            format!("uxplay-tray v{}", crate::VERSION),
            false,
            None,
        );
        menu.append(&version_item)?;

        let exit_item = MenuItem::new("Exit", true, None);
        Self::register(&mut self.actions, &menu, &exit_item, MenuAction::Exit)?;

        Ok(menu)
    }

    fn register(
        actions: &mut HashMap<MenuId, MenuAction>,
        menu: &Menu,
        item: &MenuItem,
        action: MenuAction,
    ) -> Result<(), muda::Error> {
        actions.insert(item.id().clone(), action);
        menu.append(item)
    }

    /// Reflect server state in status text and Start/Stop enablement
    pub fn update_server_state(&self, running: bool) {
        let text = if running {
            "UxPlay: Running"
        } else {
            "UxPlay: Stopped"
        };
        self.status_item.set_text(text);
        self.start_item.set_enabled(!running);
        self.stop_item.set_enabled(running);
    }

    /// Set the autostart checkmark
    pub fn update_autostart(&self, enabled: bool) {
        self.autostart_item.set_checked(enabled);
    }

    /// Get action for a menu ID
    pub fn get_action(&self, id: &MenuId) -> Option<MenuAction> {
        self.actions.get(id).copied()
    }
}

impl Default for MenuManager {
    fn default() -> Self {
        Self::new()
    }
}
