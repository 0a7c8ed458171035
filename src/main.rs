//! uxplay-launcher - headless UxPlay launcher CLI

use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use uxplay_tray::autostart::AutostartRegistrar;
use uxplay_tray::config::{
    Args, AutostartAction, Command, ConfigAction, LauncherConfig, Paths, ServiceAction,
};
use uxplay_tray::service::{self, ServiceDependency};
use uxplay_tray::supervisor::ArgumentStore;
use uxplay_tray::Orchestrator;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = LauncherConfig::load_from(args.config.as_deref())?;

    // Initialize logging
    init_logging(&args, &config)?;

    let paths = Paths::resolve(&config);

    // Execute command
    match args.command.clone().unwrap_or_default() {
        Command::Run { delay } => cmd_run(&config, &paths, delay),
        Command::Args => cmd_args(&paths),
        Command::Autostart { action } => cmd_autostart(&config, action),
        Command::Service { action } => cmd_service(&config, action),
        Command::Config { action } => cmd_config(&config, &paths, action),
    }
}

fn init_logging(args: &Args, config: &LauncherConfig) -> Result<()> {
    // Flags win over the configured level
    let level = if args.verbose == 0 && !args.quiet {
        config.log_level.clone()
    } else {
        args.log_level().to_string()
    };

    match &args.log {
        Some(log_file) => uxplay_tray::logging::init(&level, Some(Path::new(log_file)), false)?,
        None => uxplay_tray::logging::init(&level, None, true)?,
    }

    Ok(())
}

/// Run the server until Ctrl+C
fn cmd_run(config: &LauncherConfig, paths: &Paths, delay: Option<u64>) -> Result<()> {
    println!("uxplay-launcher {}\n", uxplay_tray::VERSION);

    let orchestrator = Orchestrator::from_config(config, paths)?;
    orchestrator.prepare();

    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, stopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let delay = delay
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.startup_delay());
    let initial_start = orchestrator.schedule_initial_start(delay);

    println!("Server: {}", paths.server_exe.display());
    println!("Arguments: {}", paths.arguments_file.display());
    println!("\nStarting in {:?}. Press Ctrl+C to stop.\n", delay);

    // Wait for Ctrl+C
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    orchestrator.exit();
    let _ = initial_start.join();
    println!("Stopped.");

    Ok(())
}

/// Show the arguments the server would be started with
fn cmd_args(paths: &Paths) -> Result<()> {
    let store = ArgumentStore::new(&paths.arguments_file);
    let args = store.read_arguments();

    println!("Arguments file: {}\n", store.path().display());
    if args.is_empty() {
        println!("No arguments configured.");
        return Ok(());
    }

    for (i, arg) in args.iter().enumerate() {
        println!("  {}. {}", i + 1, arg);
    }
    println!();
    Ok(())
}

fn cmd_autostart(config: &LauncherConfig, action: AutostartAction) -> Result<()> {
    let registrar = AutostartRegistrar::for_current_exe(&config.app_name)?;

    let ok = match action {
        AutostartAction::Status => true,
        AutostartAction::Enable => registrar.enable(),
        AutostartAction::Disable => registrar.disable(),
        AutostartAction::Toggle => {
            registrar.toggle();
            true
        }
    };
    if !ok {
        bail!("Autostart update failed, see log for details");
    }

    if registrar.is_enabled() {
        println!("Autostart is enabled ({}).", registrar.command());
    } else {
        println!("Autostart is disabled.");
    }
    Ok(())
}

fn cmd_service(config: &LauncherConfig, action: ServiceAction) -> Result<()> {
    let dependency = ServiceDependency::new(
        &config.service.name,
        service::platform_control(),
        config.service.poll_policy(),
    );

    let ok = match action {
        ServiceAction::Status => true,
        ServiceAction::Start => dependency.start(),
        ServiceAction::Stop => dependency.stop(),
    };

    println!("Service '{}': {}", dependency.name(), dependency.state());
    if !ok {
        bail!("Service '{}' did not reach the requested state", dependency.name());
    }
    Ok(())
}

fn cmd_config(config: &LauncherConfig, paths: &Paths, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Sample => print!("{}", LauncherConfig::sample_config()),
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(config)?);
            println!("# Resolved paths");
            println!("#   server:    {}", paths.server_exe.display());
            println!("#   arguments: {}", paths.arguments_file.display());
            println!("#   data:      {}", paths.data_dir.display());
            println!("#   log:       {}", paths.log_file.display());
        }
    }
    Ok(())
}
