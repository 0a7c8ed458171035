//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// uxplay-launcher - run and manage the UxPlay AirPlay server
///
/// Headless counterpart of the tray application
#[derive(Parser, Debug)]
#[command(name = "uxplay-launcher")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbose output (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output to file
    #[arg(long, global = true)]
    pub log: Option<String>,

    /// Configuration file (default: uxplay-tray.toml next to the executable)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the server and supervise it until Ctrl+C
    Run {
        /// Seconds to wait before the first start (default: from config)
        #[arg(long)]
        delay: Option<u64>,
    },

    /// Print the parsed server arguments
    Args,

    /// Manage autostart registration
    Autostart {
        #[command(subcommand)]
        action: AutostartAction,
    },

    /// Control the discovery service
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },

    /// Show or generate configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutostartAction {
    Status,
    Enable,
    Disable,
    Toggle,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Status,
    Start,
    Stop,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration and resolved paths
    Show,
    /// Print a commented sample configuration
    Sample,
}

impl Args {
    /// Get the log level based on verbose/quiet flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::Run { delay: None }
    }
}
