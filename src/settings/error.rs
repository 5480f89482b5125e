//! Settings store error types.

use thiserror::Error;

/// Errors that can occur while reading or writing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("Failed to access settings file: {0}")]
    Io(String),

    /// The settings file is not valid JSON for the settings schema.
    #[error("Failed to parse settings: {0}")]
    Parse(String),

    /// No setting with this name exists.
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// The setting exists but does not hold a duration in seconds.
    #[error("Setting '{0}' is not a duration")]
    NotADuration(String),

    /// The store is temporarily unavailable.
    #[error("Settings store unavailable: {0}")]
    Unavailable(String),
}

impl SettingsError {
    /// Returns true if the error comes from a missing or mistyped setting
    /// rather than from the storage backend.
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Self::UnknownSetting(_) | Self::NotADuration(_))
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
