//! JSON file backed settings store.
//!
//! Settings live in a single JSON object. A missing file reads as the
//! defaults; the file is only created by the first successful update.
//! Writes go to a sibling temporary file which is then renamed over the
//! original, so readers never observe a half-written file. An unparseable
//! file is only replaced by an update that sets both durations.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{lookup_duration, SettingsError, SettingsStore, STATUS_NOTHING_TO_UPDATE, STATUS_OK};
use crate::types::{Settings, SettingsPatch};

/// Settings store persisting to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    /// Creates a store for the given file path. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Settings, SettingsError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| SettingsError::Parse(format!("{:?}: {}", self.path, e))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No settings file at {:?}, using defaults", self.path);
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(settings)?;
        let tmp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Settings written to {:?}", self.path);
        Ok(())
    }
}

impl SettingsStore for JsonFileSettingsStore {
    async fn get_all(&self) -> Result<Settings, SettingsError> {
        self.load().await
    }

    async fn get_one(&self, name: &str) -> Result<u32, SettingsError> {
        let settings = self.load().await?;
        lookup_duration(&settings, name)
    }

    async fn update(&self, patch: &SettingsPatch) -> Result<i32, SettingsError> {
        if patch.is_empty() {
            return Ok(STATUS_NOTHING_TO_UPDATE);
        }

        let mut settings = match (self.load().await, patch.work_duration, patch.rest_duration) {
            (Ok(settings), _, _) => settings,
            (Err(SettingsError::Parse(e)), Some(work), Some(rest)) => {
                warn!("Replacing unreadable settings file: {}", e);
                Settings::new(work, rest)
            }
            (Err(e), _, _) => return Err(e),
        };
        settings.apply(patch);
        self.save(&settings).await?;

        Ok(STATUS_OK)
    }
}
