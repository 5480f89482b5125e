//! Notifications and window signals towards the host shell.
//!
//! The timer engine never renders anything itself. It reports through two
//! small traits:
//!
//! - [`NotificationBridge`]: modal alerts and transient tray messages
//! - [`HostWindow`]: fire-and-forget window signals (bring to front,
//!   minimize, maximize)
//!
//! [`ShellBridge`] implements both by forwarding [`ShellEvent`]s over a
//! crossbeam channel to the [`ConsoleShell`] thread, which owns the actual
//! output. [`MockNotificationBridge`] records every call for tests.
//!
//! # Example
//!
//! ```
//! use break_reminder::notification::{AlertKind, ConsoleShell, NotificationBridge, ShellBridge};
//!
//! let (bridge, rx) = ShellBridge::channel();
//! let shell = ConsoleShell::spawn(rx);
//!
//! bridge.alert(AlertKind::Info, "Settings loaded");
//! bridge.shutdown();
//! shell.join().unwrap();
//! ```

pub mod shell;

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::types::WindowSignal;

pub use shell::{ConsoleShell, ShellBridge, ShellEvent};

// ============================================================================
// Alert and tray message types
// ============================================================================

/// Kind of a modal alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Error,
    Question,
    Warning,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Info => "info",
            AlertKind::Error => "error",
            AlertKind::Question => "question",
            AlertKind::Warning => "warning",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Icon shown next to a tray message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrayIconType {
    None,
    Info,
    Warning,
    Error,
}

impl TrayIconType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrayIconType::None => "none",
            TrayIconType::Info => "info",
            TrayIconType::Warning => "warning",
            TrayIconType::Error => "error",
        }
    }
}

/// A transient tray notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayMessage {
    pub icon_type: TrayIconType,
    pub content: String,
}

impl TrayMessage {
    pub fn new(icon_type: TrayIconType, content: impl Into<String>) -> Self {
        Self {
            icon_type,
            content: content.into(),
        }
    }

    /// Creates an informational tray message.
    pub fn info(content: impl Into<String>) -> Self {
        Self::new(TrayIconType::Info, content)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Forwards user-facing notifications to the host shell.
pub trait NotificationBridge {
    /// Shows a modal alert.
    fn alert(&self, kind: AlertKind, message: &str);

    /// Shows a transient tray message.
    fn tray_message(&self, message: TrayMessage);
}

/// Forwards window signals to the host shell. No response is expected.
pub trait HostWindow {
    fn send_window_signal(&self, signal: WindowSignal);
}

impl<T: NotificationBridge + ?Sized> NotificationBridge for Arc<T> {
    fn alert(&self, kind: AlertKind, message: &str) {
        self.as_ref().alert(kind, message);
    }

    fn tray_message(&self, message: TrayMessage) {
        self.as_ref().tray_message(message);
    }
}

impl<T: HostWindow + ?Sized> HostWindow for Arc<T> {
    fn send_window_signal(&self, signal: WindowSignal) {
        self.as_ref().send_window_signal(signal);
    }
}

// ============================================================================
// MockNotificationBridge
// ============================================================================

#[derive(Debug, Default)]
pub struct MockNotificationBridge {
    alerts: Mutex<Vec<(AlertKind, String)>>,
    tray_messages: Mutex<Vec<TrayMessage>>,
    window_signals: Mutex<Vec<WindowSignal>>,
}

impl MockNotificationBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn alerts(&self) -> Vec<(AlertKind, String)> {
        self.alerts.lock().unwrap().clone()
    }

    #[must_use]
    pub fn tray_messages(&self) -> Vec<TrayMessage> {
        self.tray_messages.lock().unwrap().clone()
    }

    #[must_use]
    pub fn window_signals(&self) -> Vec<WindowSignal> {
        self.window_signals.lock().unwrap().clone()
    }

    #[must_use]
    pub fn error_alert_count(&self) -> usize {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _)| *kind == AlertKind::Error)
            .count()
    }

    pub fn clear(&self) {
        self.alerts.lock().unwrap().clear();
        self.tray_messages.lock().unwrap().clear();
        self.window_signals.lock().unwrap().clear();
    }
}

impl NotificationBridge for MockNotificationBridge {
    fn alert(&self, kind: AlertKind, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((kind, message.to_string()));
    }

    fn tray_message(&self, message: TrayMessage) {
        self.tray_messages.lock().unwrap().push(message);
    }
}

impl HostWindow for MockNotificationBridge {
    fn send_window_signal(&self, signal: WindowSignal) {
        self.window_signals.lock().unwrap().push(signal);
    }
}
