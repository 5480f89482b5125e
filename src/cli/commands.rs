//! Command definitions for the break reminder CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::types::{SettingsPatch, WindowSignal, TRAY_MSG_WHEN_ELAPSED};

// ============================================================================
// CLI Structure
// ============================================================================

/// Break reminder - alternate work and rest countdowns
#[derive(Parser, Debug)]
#[command(
    name = "break-reminder",
    version,
    about = "Work/rest countdown timer reminding you to take breaks",
    long_about = "A work/rest countdown timer.\n\
                  Run `break-reminder daemon` once, then control the timer from any terminal.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path of the daemon socket
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer daemon in the foreground
    Daemon,

    /// Start the countdown if paused, pause it if running
    Toggle,

    /// Start the countdown if it is paused
    Start,

    /// Pause the countdown if it is running
    Pause,

    /// Switch between work and rest
    Switch,

    /// Restart the current mode from its full duration
    Replay,

    /// Reload settings and reset to a paused work countdown
    Reset,

    /// Show current timer status
    Status,

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Send a signal to the timer window
    Window {
        /// Signal to send
        #[arg(value_enum)]
        signal: WindowArg,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Show all settings
    Show,

    /// Show a single duration setting
    Get {
        /// Setting name (e.g. workDuration)
        name: String,
    },

    /// Change settings
    Set(SetArgs),
}

/// Window signals accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowArg {
    /// Show the window and bring it to the front
    Front,
    Minimize,
    Maximize,
}

impl From<WindowArg> for WindowSignal {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Front => WindowSignal::BringToFront,
            WindowArg::Minimize => WindowSignal::Minimize,
            WindowArg::Maximize => WindowSignal::Maximize,
        }
    }
}

// ============================================================================
// Settings Set Arguments
// ============================================================================

/// Arguments for `settings set`
#[derive(Args, Debug, Clone, Default)]
#[command(group(
    ArgGroup::new("changes")
        .required(true)
        .multiple(true)
        .args(["work", "rest", "tray_on_elapsed"])
))]
pub struct SetArgs {
    /// Work duration in minutes (1-120)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=120)
    )]
    pub work: Option<u32>,

    /// Rest duration in minutes (1-60)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub rest: Option<u32>,

    /// Show a tray message when a countdown elapses
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub tray_on_elapsed: Option<bool>,
}

impl SetArgs {
    /// Converts the arguments to a settings patch, minutes to seconds.
    pub fn to_patch(&self) -> SettingsPatch {
        let mut patch = SettingsPatch::default();
        if let Some(work) = self.work {
            patch = patch.with_work_duration(work * 60);
        }
        if let Some(rest) = self.rest {
            patch = patch.with_rest_duration(rest * 60);
        }
        if let Some(flag) = self.tray_on_elapsed {
            patch = patch.with_extra(TRAY_MSG_WHEN_ELAPSED, Value::Bool(flag));
        }
        patch
    }
}

// ============================================================================
// Tests
// ============================================================================
