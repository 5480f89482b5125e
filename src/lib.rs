//! Break Reminder Library
//!
//! This library provides the core functionality for the break reminder.
//! It includes:
//! - Timer engine alternating work and rest countdowns
//! - Settings store contract with a JSON file backend
//! - Notification bridge and host window signals
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Type definitions for settings, state and IPC messages

pub mod cli;
pub mod config;
pub mod daemon;
pub mod notification;
pub mod settings;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    IpcRequest, IpcResponse, ResponseData, Settings, SettingsPatch, TimerMode, TimerSnapshot,
    TimerState, WindowSignal,
};

pub use config::AppConfig;

pub use daemon::{Daemon, EngineError, RequestHandler, TickSignal, TimerEngine};

pub use notification::{
    AlertKind, ConsoleShell, HostWindow, MockNotificationBridge, NotificationBridge, ShellBridge,
    TrayIconType, TrayMessage,
};

pub use settings::{
    file::JsonFileSettingsStore, MockSettingsStore, SettingsError, SettingsStore,
};
