//! Settings storage for the break reminder.
//!
//! The timer engine talks to storage only through [`SettingsStore`]:
//! - `get_all` returns every setting
//! - `get_one` returns one duration by name
//! - `update` applies a partial update and returns a status code,
//!   where [`STATUS_OK`] means success
//!
//! [`JsonFileSettingsStore`] persists to a JSON file. [`MockSettingsStore`]
//! keeps settings in memory and can be told to fail, for tests.

pub mod error;
pub mod file;

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::types::{Settings, SettingsPatch};

pub use error::SettingsError;
pub use file::JsonFileSettingsStore;

/// Update status meaning the settings were written.
pub const STATUS_OK: i32 = 0;

/// Update status meaning the patch named no field.
pub const STATUS_NOTHING_TO_UPDATE: i32 = 1;

#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    async fn get_all(&self) -> Result<Settings, SettingsError>;
    async fn get_one(&self, name: &str) -> Result<u32, SettingsError>;
    async fn update(&self, patch: &SettingsPatch) -> Result<i32, SettingsError>;
}

impl<T: SettingsStore> SettingsStore for Arc<T> {
    async fn get_all(&self) -> Result<Settings, SettingsError> {
        self.as_ref().get_all().await
    }

    async fn get_one(&self, name: &str) -> Result<u32, SettingsError> {
        self.as_ref().get_one(name).await
    }

    async fn update(&self, patch: &SettingsPatch) -> Result<i32, SettingsError> {
        self.as_ref().update(patch).await
    }
}

/// Looks up a setting and reads it as a duration in seconds.
pub fn lookup_duration(settings: &Settings, name: &str) -> Result<u32, SettingsError> {
    let value = settings
        .value(name)
        .ok_or_else(|| SettingsError::UnknownSetting(name.to_string()))?;

    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| SettingsError::NotADuration(name.to_string()))
}

// ============================================================================
// MockSettingsStore
// ============================================================================

#[derive(Debug)]
pub struct MockSettingsStore {
    settings: Mutex<Settings>,
    update_calls: Mutex<Vec<SettingsPatch>>,
    should_fail_reads: AtomicBool,
    should_fail_updates: AtomicBool,
    update_status: AtomicI32,
}

impl Default for MockSettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl MockSettingsStore {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            update_calls: Mutex::new(Vec::new()),
            should_fail_reads: AtomicBool::new(false),
            should_fail_updates: AtomicBool::new(false),
            update_status: AtomicI32::new(STATUS_OK),
        }
    }

    pub fn set_should_fail_reads(&self, should_fail: bool) {
        self.should_fail_reads.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_updates(&self, should_fail: bool) {
        self.should_fail_updates.store(should_fail, Ordering::SeqCst);
    }

    /// Makes `update` return this status without writing.
    pub fn set_update_status(&self, status: i32) {
        self.update_status.store(status, Ordering::SeqCst);
    }

    /// Replaces the stored settings behind the engine's back.
    pub fn set_settings(&self, settings: Settings) {
        *self.settings.lock().unwrap() = settings;
    }

    pub fn set_value(&self, name: &str, value: Value) {
        self.settings
            .lock()
            .unwrap()
            .extra
            .insert(name.to_string(), value);
    }

    #[must_use]
    pub fn stored(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    #[must_use]
    pub fn update_call_count(&self) -> usize {
        self.update_calls.lock().unwrap().len()
    }

    fn check_reads(&self) -> Result<(), SettingsError> {
        if self.should_fail_reads.load(Ordering::SeqCst) {
            return Err(SettingsError::Unavailable("simulated read failure".to_string()));
        }
        Ok(())
    }
}

impl SettingsStore for MockSettingsStore {
    async fn get_all(&self) -> Result<Settings, SettingsError> {
        self.check_reads()?;
        Ok(self.stored())
    }

    async fn get_one(&self, name: &str) -> Result<u32, SettingsError> {
        self.check_reads()?;
        lookup_duration(&self.settings.lock().unwrap(), name)
    }

    async fn update(&self, patch: &SettingsPatch) -> Result<i32, SettingsError> {
        self.update_calls.lock().unwrap().push(patch.clone());

        if self.should_fail_updates.load(Ordering::SeqCst) {
            return Err(SettingsError::Unavailable(
                "simulated update failure".to_string(),
            ));
        }

        let status = self.update_status.load(Ordering::SeqCst);
        if status == STATUS_OK {
            self.settings.lock().unwrap().apply(patch);
        }
        Ok(status)
    }
}
