//! uxplay-tray - UxPlay launcher in the notification area
//!
//! Run with `--debug` to show a console window with log output.

// Hide console window unless --debug is passed
#![windows_subsystem = "windows"]

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use std::env;
    use tracing::info;
    use uxplay_tray::config::{LauncherConfig, Paths};
    use uxplay_tray::tray::{TrayApp, TrayConfig};
    use uxplay_tray::Orchestrator;

    let args: Vec<String> = env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    // In debug mode, allocate a console window for stdout/stderr
    if debug_mode {
        unsafe {
            windows::Win32::System::Console::AllocConsole()?;
        }
    }

    let config = LauncherConfig::load_default()?;
    let paths = Paths::resolve(&config);
    uxplay_tray::logging::init(&config.log_level, Some(&paths.log_file), debug_mode)?;
    info!("uxplay-tray {} starting", uxplay_tray::VERSION);

    let orchestrator = Orchestrator::from_config(&config, &paths)?;
    let tray_config = TrayConfig {
        tooltip: config.app_name.clone(),
        icon_path: paths.icon_file.clone(),
        auto_start: true,
        startup_delay: config.startup_delay(),
    };

    let mut app = TrayApp::new(tray_config, orchestrator)?;
    app.run()?;

    Ok(())
}

#[cfg(not(windows))]
fn main() {
    eprintln!("uxplay-tray needs Windows; use uxplay-launcher on this platform");
    std::process::exit(1);
}
