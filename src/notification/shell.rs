//! Host shell plumbing.
//!
//! The daemon's async loop must never block on terminal output, so every
//! notification is turned into a [`ShellEvent`] and sent over an unbounded
//! crossbeam channel. [`ConsoleShell`] drains the channel on a dedicated
//! thread and renders each event.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info};

use super::{AlertKind, HostWindow, NotificationBridge, TrayMessage};
use crate::types::WindowSignal;

// ============================================================================
// ShellEvent
// ============================================================================

/// Events delivered to the host shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// Show a modal alert
    Alert { kind: AlertKind, message: String },
    /// Show a transient tray message
    TrayMessage(TrayMessage),
    /// Forward a window signal
    Window(WindowSignal),
    /// Stop the shell thread
    Shutdown,
}

// ============================================================================
// ShellBridge
// ============================================================================

/// Notification bridge sending events to the host shell thread.
#[derive(Debug, Clone)]
pub struct ShellBridge {
    tx: Sender<ShellEvent>,
}

impl ShellBridge {
    pub fn new(tx: Sender<ShellEvent>) -> Self {
        Self { tx }
    }

    /// Creates a bridge together with the receiving end for the shell.
    pub fn channel() -> (Self, Receiver<ShellEvent>) {
        let (tx, rx) = unbounded();
        (Self::new(tx), rx)
    }

    /// Asks the shell thread to stop.
    pub fn shutdown(&self) {
        self.send(ShellEvent::Shutdown);
    }

    fn send(&self, event: ShellEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("Host shell is gone, dropping {:?}", e.into_inner());
        }
    }
}

impl NotificationBridge for ShellBridge {
    fn alert(&self, kind: AlertKind, message: &str) {
        self.send(ShellEvent::Alert {
            kind,
            message: message.to_string(),
        });
    }

    fn tray_message(&self, message: TrayMessage) {
        self.send(ShellEvent::TrayMessage(message));
    }
}

impl HostWindow for ShellBridge {
    fn send_window_signal(&self, signal: WindowSignal) {
        self.send(ShellEvent::Window(signal));
    }
}

// ============================================================================
// ConsoleShell
// ============================================================================

/// Host shell rendering events to the terminal.
pub struct ConsoleShell;

impl ConsoleShell {
    /// Spawns the shell thread. It exits on [`ShellEvent::Shutdown`] or when
    /// every sender has been dropped.
    pub fn spawn(rx: Receiver<ShellEvent>) -> JoinHandle<()> {
        thread::spawn(move || {
            for event in rx.iter() {
                if event == ShellEvent::Shutdown {
                    break;
                }
                Self::handle(&event);
            }
            debug!("Host shell stopped");
        })
    }

    fn handle(event: &ShellEvent) {
        match event {
            ShellEvent::Alert {
                kind: AlertKind::Error | AlertKind::Warning,
                ..
            } => {
                if let Some(line) = Self::render(event) {
                    eprintln!("{}", line);
                }
            }
            ShellEvent::Window(signal) => {
                info!("Window signal: {}", signal.as_str());
            }
            _ => {
                if let Some(line) = Self::render(event) {
                    println!("{}", line);
                }
            }
        }
    }

    /// Returns the terminal line for an event, if it has one.
    pub fn render(event: &ShellEvent) -> Option<String> {
        match event {
            ShellEvent::Alert { kind, message } => Some(format!("[{}] {}", kind, message)),
            ShellEvent::TrayMessage(message) => Some(format!(
                "(tray:{}) {}",
                message.icon_type.as_str(),
                message.content
            )),
            ShellEvent::Window(_) | ShellEvent::Shutdown => None,
        }
    }
}
