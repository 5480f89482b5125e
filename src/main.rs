//! break-reminder - a work/rest countdown timer
//!
//! Run `break-reminder daemon` to start the timer, then drive it from any
//! terminal:
//! - `toggle` starts or pauses the countdown
//! - `switch` moves between work and rest
//! - `settings set --work 50 --rest 10` changes the durations

use anyhow::Result;
use clap::{CommandFactory, Parser};

use break_reminder::cli::{Cli, Commands, Display, IpcClient, SettingsCommand};
use break_reminder::config::AppConfig;
use break_reminder::daemon;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, matches!(cli.command, Some(Commands::Daemon)));

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins over `--verbose`. The daemon logs with timestamps.
fn init_tracing(verbose: bool, with_time: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt().with_env_filter(filter).with_target(false);
    if with_time {
        builder.init();
    } else {
        builder.without_time().init();
    }
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let socket = cli.socket;
    let client = || -> Result<IpcClient> {
        let config = AppConfig::load(socket.clone())?;
        Ok(IpcClient::new(config.socket_path))
    };

    match cli.command {
        Some(Commands::Daemon) => {
            let config = AppConfig::load(socket.clone())?;
            tracing::info!("Settings file {:?}", config.settings_path);
            daemon::run_daemon(&config).await?;
        }
        Some(Commands::Toggle) => Display::show_timer_action(&client()?.toggle().await?),
        Some(Commands::Start) => Display::show_timer_action(&client()?.start().await?),
        Some(Commands::Pause) => Display::show_timer_action(&client()?.pause().await?),
        Some(Commands::Switch) => Display::show_timer_action(&client()?.switch_mode().await?),
        Some(Commands::Replay) => Display::show_timer_action(&client()?.replay().await?),
        Some(Commands::Reset) => Display::show_timer_action(&client()?.reset().await?),
        Some(Commands::Status) => Display::show_status(&client()?.status().await?),
        Some(Commands::Settings(SettingsCommand::Show)) => {
            Display::show_settings(&client()?.settings().await?);
        }
        Some(Commands::Settings(SettingsCommand::Get { name })) => {
            Display::show_setting(&client()?.setting(&name).await?);
        }
        Some(Commands::Settings(SettingsCommand::Set(args))) => {
            let response = client()?.update_settings(args.to_patch()).await?;
            Display::show_message(&response);
            Display::show_settings(&response);
        }
        Some(Commands::Window { signal }) => {
            Display::show_message(&client()?.window(signal.into()).await?);
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
