//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Phone Fleet - connect, watch and mirror a roster of Android devices
#[derive(Parser, Debug)]
#[command(name = "pfleet")]
#[command(about = "Manage a roster of adb devices and their scrcpy mirrors", long_about = None)]
pub struct Args {
    /// Directory holding config.toml and roster.json
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Print one JSON object per outcome instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Skip `adb start-server` before running the command
    #[arg(long, global = true)]
    pub no_start_server: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// The requested command; `list` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::List)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the roster with live connection status
    List,

    /// Add a device (`host:port` or USB serial) to the roster
    Add { id: String },

    /// Remove a device from the roster
    Remove { id: String },

    /// Switch the single USB device to TCP/IP and add its network address
    AutoDetect,

    /// Connect one device, or every roster device
    Connect { id: Option<String> },

    /// Disconnect one device, or every device
    Disconnect { id: Option<String> },

    /// Launch a mirroring window for one device, or every roster device
    Launch {
        id: Option<String>,

        /// Window index for a device outside the roster
        #[arg(long, requires = "id")]
        index: Option<usize>,
    },

    /// Poll and print the roster status until interrupted
    Watch {
        /// Seconds between polls (defaults to watch.poll_interval_secs)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },

    /// Write a default config.toml to the fleet directory
    Init,
}

impl Command {
    /// Whether the command talks to the device bridge
    pub fn uses_bridge(&self) -> bool {
        !matches!(self, Command::Init)
    }
}
