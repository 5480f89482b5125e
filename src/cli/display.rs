//! Display utilities for the break reminder CLI.
//!
//! This module provides formatted output for:
//! - Timer action results
//! - Status display
//! - Settings
//! - Error messages

use crate::types::{
    format_seconds, IpcResponse, Settings, TimerSnapshot, REST_DURATION, WORK_DURATION,
};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a timer action (toggle, switch, replay...).
    pub fn show_timer_action(response: &IpcResponse) {
        println!("{}", Self::format_timer_action(response));
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("{}", Self::format_status(response));
    }

    /// Shows all settings.
    pub fn show_settings(response: &IpcResponse) {
        println!("{}", Self::format_settings(response));
    }

    /// Shows a single setting.
    pub fn show_setting(response: &IpcResponse) {
        if let Some(entry) = response.data.as_ref().and_then(|d| d.setting.as_ref()) {
            println!("{} = {}", entry.name, entry.value);
        }
    }

    /// Shows a plain confirmation message.
    pub fn show_message(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("{}", response.message);
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    fn format_timer_action(response: &IpcResponse) -> String {
        match response.timer() {
            Some(timer) => format!(
                "{} {}\n  {} {}",
                timer.glyph,
                response.message,
                format_seconds(timer.seconds_remaining),
                timer.label
            ),
            None => response.message.clone(),
        }
    }

    fn format_status(response: &IpcResponse) -> String {
        let Some(timer) = response.timer() else {
            return "Timer is not available".to_string();
        };

        let mut lines = vec![
            "Break reminder status".to_string(),
            "─────────────────────".to_string(),
            format!("{} {}", timer.glyph, timer.label),
            format!("Mode:      {}", timer.mode.label()),
            format!("Remaining: {}", format_seconds(timer.seconds_remaining)),
        ];
        lines.push(Self::hint(timer));
        lines.join("\n")
    }

    fn hint(timer: &TimerSnapshot) -> String {
        if timer.elapsed {
            format!("Time is up. Run 'switch' to start {}.", timer.next_mode_verb)
        } else {
            format!("Run 'switch' to start {}.", timer.next_mode_verb)
        }
    }

    fn format_settings(response: &IpcResponse) -> String {
        match response.data.as_ref().and_then(|d| d.settings.as_ref()) {
            Some(settings) => Self::settings_lines(settings).join("\n"),
            None => "No settings returned".to_string(),
        }
    }

    fn settings_lines(settings: &Settings) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{:<30} {} ({})",
                WORK_DURATION,
                settings.work_duration,
                format_seconds(settings.work_duration)
            ),
            format!(
                "{:<30} {} ({})",
                REST_DURATION,
                settings.rest_duration,
                format_seconds(settings.rest_duration)
            ),
        ];
        for (name, value) in &settings.extra {
            lines.push(format!("{:<30} {}", name, value));
        }
        lines
    }
}

// ============================================================================
// Tests
// ============================================================================
