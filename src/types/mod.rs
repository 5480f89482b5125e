//! Core data types for the break reminder.
//!
//! This module defines the data structures used for:
//! - Countdown state and the display values derived from it
//! - Duration settings with opaque extension fields
//! - IPC request/response serialization

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Setting names
// ============================================================================

/// Setting name of the work duration (seconds).
pub const WORK_DURATION: &str = "workDuration";

/// Setting name of the rest duration (seconds).
pub const REST_DURATION: &str = "restDuration";

/// Extension setting: show a tray message when a countdown runs out.
pub const TRAY_MSG_WHEN_ELAPSED: &str = "wantsTrayMsgWhenTimerElapsed";

/// Default work duration in seconds (25 minutes).
pub const DEFAULT_WORK_SECONDS: u32 = 25 * 60;

/// Default rest duration in seconds (5 minutes).
pub const DEFAULT_REST_SECONDS: u32 = 5 * 60;

// ============================================================================
// TimerMode
// ============================================================================

/// Which interval the countdown is measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Work interval
    Work,
    /// Rest interval
    Rest,
}

impl TimerMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::Rest => "rest",
        }
    }

    /// Returns the capitalized base label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Work => "Work",
            TimerMode::Rest => "Rest",
        }
    }

    /// Returns the mode a switch would move into.
    pub fn opposite(&self) -> Self {
        match self {
            TimerMode::Work => TimerMode::Rest,
            TimerMode::Rest => TimerMode::Work,
        }
    }

    /// Returns the setting name holding this mode's duration.
    pub fn duration_key(&self) -> &'static str {
        match self {
            TimerMode::Work => WORK_DURATION,
            TimerMode::Rest => REST_DURATION,
        }
    }
}

impl Default for TimerMode {
    fn default() -> Self {
        TimerMode::Work
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Countdown state owned by the timer engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimerState {
    /// Seconds left in the current interval
    pub seconds_remaining: u32,
    /// Current mode
    pub mode: TimerMode,
    /// Whether the countdown is ticking
    pub running: bool,
}

impl TimerState {
    /// Creates the initial state: zero seconds, work mode, not running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the countdown has reached zero.
    pub fn is_elapsed(&self) -> bool {
        self.seconds_remaining == 0
    }

    /// Returns true if the countdown is not ticking.
    pub fn is_paused(&self) -> bool {
        !self.running
    }

    /// Returns the label describing the current mode.
    ///
    /// - Elapsed: "Waiting for input."
    /// - Paused: "Work." / "Rest."
    /// - Running: "Working ..." / "Resting ..."
    pub fn current_mode_label(&self) -> String {
        if self.is_elapsed() {
            return "Waiting for input.".to_string();
        }

        let base = self.mode.label();
        if self.running {
            format!("{}ing ...", base)
        } else {
            format!("{}.", base)
        }
    }

    /// Returns the verb for the mode a switch would move into.
    pub fn next_mode_verb(&self) -> &'static str {
        match self.mode {
            TimerMode::Work => "resting",
            TimerMode::Rest => "working",
        }
    }

    /// Returns the play/pause indicator.
    pub fn play_pause_glyph(&self) -> &'static str {
        if self.running {
            "⏸"
        } else {
            "▶"
        }
    }

    /// Formats the remaining time as `MM:SS`.
    pub fn formatted_remaining(&self) -> String {
        format_seconds(self.seconds_remaining)
    }
}

/// Formats a number of seconds as `MM:SS`.
pub fn format_seconds(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// Settings
// ============================================================================

fn default_work_duration() -> u32 {
    DEFAULT_WORK_SECONDS
}

fn default_rest_duration() -> u32 {
    DEFAULT_REST_SECONDS
}

/// Persisted duration settings.
///
/// Durations are in seconds. Any additional key is kept as an opaque
/// extension field and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Work interval in seconds
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    /// Rest interval in seconds
    #[serde(default = "default_rest_duration")]
    pub rest_duration: u32,
    /// Extension fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: DEFAULT_WORK_SECONDS,
            rest_duration: DEFAULT_REST_SECONDS,
            extra: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Creates settings with the given durations and no extension fields.
    pub fn new(work_duration: u32, rest_duration: u32) -> Self {
        Self {
            work_duration,
            rest_duration,
            extra: BTreeMap::new(),
        }
    }

    /// Adds an extension field.
    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Returns the duration used by the given mode.
    pub fn duration_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work_duration,
            TimerMode::Rest => self.rest_duration,
        }
    }

    /// Returns the raw value of a setting by name.
    pub fn value(&self, name: &str) -> Option<Value> {
        match name {
            WORK_DURATION => Some(Value::from(self.work_duration)),
            REST_DURATION => Some(Value::from(self.rest_duration)),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Returns a boolean extension field, `false` when absent.
    pub fn flag(&self, name: &str) -> bool {
        self.extra
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Overwrites the fields named by the patch.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(work) = patch.work_duration {
            self.work_duration = work;
        }
        if let Some(rest) = patch.rest_duration {
            self.rest_duration = rest;
        }
        for (name, value) in &patch.extra {
            self.extra.insert(name.clone(), value.clone());
        }
    }
}

/// Partial settings update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New work interval in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<u32>,
    /// New rest interval in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_duration: Option<u32>,
    /// Extension fields to set
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SettingsPatch {
    pub fn with_work_duration(mut self, seconds: u32) -> Self {
        self.work_duration = Some(seconds);
        self
    }

    pub fn with_rest_duration(mut self, seconds: u32) -> Self {
        self.rest_duration = Some(seconds);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Returns true if the patch names no field.
    pub fn is_empty(&self) -> bool {
        self.work_duration.is_none() && self.rest_duration.is_none() && self.extra.is_empty()
    }
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            work_duration: Some(settings.work_duration),
            rest_duration: Some(settings.rest_duration),
            extra: settings.extra,
        }
    }
}

// ============================================================================
// WindowSignal
// ============================================================================

/// One-way signals to the host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSignal {
    /// Show the window and bring it to the front
    BringToFront,
    /// Minimize the window
    Minimize,
    /// Maximize the window
    Maximize,
}

impl WindowSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowSignal::BringToFront => "bring_to_front",
            WindowSignal::Minimize => "minimize",
            WindowSignal::Maximize => "maximize",
        }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
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
    /// Reload settings and reset to the work duration
    Reset,
    /// Query the current status
    Status,
    /// Fetch all settings
    Settings,
    /// Fetch a single setting
    Setting {
        /// Setting name
        name: String,
    },
    /// Update settings
    Update {
        /// Fields to change
        settings: SettingsPatch,
    },
    /// Forward a signal to the host window
    Window {
        /// Signal to forward
        signal: WindowSignal,
    },
}

/// Timer state plus derived display values, as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub seconds_remaining: u32,
    pub running: bool,
    pub elapsed: bool,
    pub label: String,
    pub next_mode_verb: String,
    pub glyph: String,
}

impl TimerSnapshot {
    /// Creates a snapshot from timer state.
    pub fn from_timer_state(state: &TimerState) -> Self {
        Self {
            mode: state.mode,
            seconds_remaining: state.seconds_remaining,
            running: state.running,
            elapsed: state.is_elapsed(),
            label: state.current_mode_label(),
            next_mode_verb: state.next_mode_verb().to_string(),
            glyph: state.play_pause_glyph().to_string(),
        }
    }
}

/// A single named setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub name: String,
    pub value: u32,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Timer snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerSnapshot>,
    /// Cached settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    /// A single setting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setting: Option<SettingEntry>,
}

impl ResponseData {
    /// Creates response data holding a timer snapshot.
    pub fn from_timer_state(state: &TimerState) -> Self {
        Self {
            timer: Some(TimerSnapshot::from_timer_state(state)),
            ..Default::default()
        }
    }

    /// Creates response data holding settings.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
            ..Default::default()
        }
    }

    /// Creates response data holding one setting.
    pub fn from_setting(name: impl Into<String>, value: u32) -> Self {
        Self {
            setting: Some(SettingEntry {
                name: name.into(),
                value,
            }),
            ..Default::default()
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Returns the timer snapshot, if the response carries one.
    pub fn timer(&self) -> Option<&TimerSnapshot> {
        self.data.as_ref().and_then(|d| d.timer.as_ref())
    }
}

// ============================================================================
// Tests
// ============================================================================
