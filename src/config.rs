//! Application paths.
//!
//! Both the daemon and the CLI client need to agree on where the socket
//! lives. Defaults sit under `~/.break-reminder/`; environment variables
//! override the defaults and the `--socket` flag overrides both.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Directory under the home directory holding all application files.
pub const APP_DIR: &str = ".break-reminder";

/// Settings file name.
pub const SETTINGS_FILE: &str = "settings.json";

/// Socket file name.
pub const SOCKET_FILE: &str = "break-reminder.sock";

/// Environment variable overriding the settings file path.
pub const SETTINGS_ENV: &str = "BREAK_REMINDER_SETTINGS";

/// Environment variable overriding the socket path.
pub const SOCKET_ENV: &str = "BREAK_REMINDER_SOCKET";

/// Resolved file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub socket_path: PathBuf,
    pub settings_path: PathBuf,
}

impl AppConfig {
    /// Resolves paths from the home directory, the process environment and
    /// an optional socket path from the command line.
    ///
    /// # Errors
    ///
    /// Returns an error if a default path is needed and the home directory
    /// cannot be determined.
    pub fn load(socket_flag: Option<PathBuf>) -> Result<Self> {
        Self::resolve(dirs::home_dir(), |name| std::env::var(name).ok(), socket_flag)
    }

    /// Resolves paths from explicit inputs.
    pub fn resolve(
        home: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
        socket_flag: Option<PathBuf>,
    ) -> Result<Self> {
        let from_env = |name: &str| env(name).filter(|v| !v.is_empty()).map(PathBuf::from);
        let default_in_home = |file: &str| -> Result<PathBuf> {
            let home = home
                .as_ref()
                .context("Could not determine the home directory")?;
            Ok(home.join(APP_DIR).join(file))
        };

        let socket_path = match socket_flag.or_else(|| from_env(SOCKET_ENV)) {
            Some(path) => path,
            None => default_in_home(SOCKET_FILE)?,
        };
        let settings_path = match from_env(SETTINGS_ENV) {
            Some(path) => path,
            None => default_in_home(SETTINGS_FILE)?,
        };

        Ok(Self {
            socket_path,
            settings_path,
        })
    }
}
