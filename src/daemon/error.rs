//! Timer engine error types.

use thiserror::Error;

use crate::settings::SettingsError;

/// Errors returned by timer engine actions.
///
/// By the time one of these reaches a caller the engine has already logged
/// it and, where the action calls for it, alerted the user.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The settings store failed.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Settings could not be fetched.
    #[error("Settings are unavailable")]
    SettingsUnavailable,

    /// The settings store answered an update with a non-zero status.
    #[error("Settings update was rejected (status {0})")]
    UpdateRejected(i32),
}
