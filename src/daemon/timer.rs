//! Timer engine for the break reminder.
//!
//! This module provides the countdown state machine:
//! - Start/pause toggling backed by a single periodic tick task
//! - Work/rest mode switching with durations read from the settings store
//! - Replay of the current mode and reset to the work duration
//! - Cached settings, refreshed and updated through the settings store
//!
//! The tick task never touches the state. It only sends [`TickSignal`]s,
//! which the daemon loop feeds back through [`TimerEngine::on_tick`], so all
//! mutation happens on one execution context.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::notification::{AlertKind, NotificationBridge, TrayMessage};
use crate::settings::{SettingsStore, STATUS_OK};
use crate::types::{Settings, SettingsPatch, TimerMode, TimerState, TRAY_MSG_WHEN_ELAPSED};

use super::error::EngineError;

/// Period of the countdown tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Tray message shown after a successful settings update.
pub const SETTINGS_UPDATED_MESSAGE: &str = "Your settings have been updated.";

// ============================================================================
// TickSignal / TickHandle
// ============================================================================

/// One period elapsed on the tick task with the given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSignal {
    pub generation: u64,
}

/// Owns a running tick task. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct TickHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl TickHandle {
    /// Spawns a task sending a [`TickSignal`] every `period`, starting one
    /// period from now.
    fn spawn(generation: u64, period: Duration, tx: mpsc::UnboundedSender<TickSignal>) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if tx.send(TickSignal { generation }).is_err() {
                    break;
                }
            }
        });

        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Countdown engine owning the timer state, the settings cache and the tick
/// handle.
///
/// Invariant: `tick_handle.is_some() == state.running`.
pub struct TimerEngine<S, N> {
    /// Countdown state
    state: TimerState,
    /// Last settings fetched from (or written to) the store
    settings: Settings,
    store: S,
    notifier: N,
    /// Active tick task, if running
    tick_handle: Option<TickHandle>,
    /// Where tick tasks send their signals
    tick_tx: mpsc::UnboundedSender<TickSignal>,
    tick_period: Duration,
    /// Generation of the most recently spawned tick task
    generation: u64,
}

impl<S: SettingsStore, N: NotificationBridge> TimerEngine<S, N> {
    /// Creates an engine in the initial state (0 seconds, work mode, paused)
    /// with default settings cached. Call
    /// [`reset_to_work_duration`](Self::reset_to_work_duration) to load the
    /// stored settings.
    pub fn new(store: S, notifier: N, tick_tx: mpsc::UnboundedSender<TickSignal>) -> Self {
        Self {
            state: TimerState::new(),
            settings: Settings::default(),
            store,
            notifier,
            tick_handle: None,
            tick_tx,
            tick_period: TICK_PERIOD,
            generation: 0,
        }
    }

    /// Overrides the tick period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Returns the cached settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Returns true if a tick task is active.
    pub fn has_active_tick(&self) -> bool {
        self.tick_handle.is_some()
    }

    /// Returns the generation of the active tick task.
    pub fn active_generation(&self) -> Option<u64> {
        self.tick_handle.as_ref().map(TickHandle::generation)
    }

    // ------------------------------------------------------------------------
    // Tick handling
    // ------------------------------------------------------------------------

    fn start_ticking(&mut self) {
        self.cancel_tick();
        self.generation += 1;
        debug!("Starting tick generation {}", self.generation);
        self.tick_handle = Some(TickHandle::spawn(
            self.generation,
            self.tick_period,
            self.tick_tx.clone(),
        ));
    }

    fn cancel_tick(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            debug!("Cancelling tick generation {}", handle.generation());
        }
    }

    /// Applies a tick signal if it comes from the active tick task.
    ///
    /// Returns true if the signal was applied. Signals from cancelled tasks
    /// may still be queued and are dropped here.
    pub fn on_tick(&mut self, signal: TickSignal) -> bool {
        if self.active_generation() != Some(signal.generation) {
            debug!("Ignoring stale tick from generation {}", signal.generation);
            return false;
        }
        self.tick();
        true
    }

    /// Decrements the countdown by one second.
    ///
    /// When the countdown is (or becomes) zero the tick is cancelled and the
    /// engine pauses. Returns true on exhaustion.
    pub(crate) fn tick(&mut self) -> bool {
        if !self.state.running {
            return false;
        }

        if self.state.seconds_remaining > 0 {
            self.state.seconds_remaining -= 1;
        }

        if self.state.seconds_remaining > 0 {
            return false;
        }

        self.cancel_tick();
        self.state.running = false;
        info!("{} countdown elapsed", self.state.mode.label());

        if self.settings.flag(TRAY_MSG_WHEN_ELAPSED) {
            self.notifier.tray_message(TrayMessage::info(format!(
                "{} is over. Switch to {} when you are ready.",
                self.state.mode.label(),
                self.state.next_mode_verb()
            )));
        }

        true
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Starts the countdown if paused, pauses it if running.
    pub fn toggle_run(&mut self) {
        if self.state.running {
            self.cancel_tick();
            self.state.running = false;
            info!("Timer paused at {}", self.state.formatted_remaining());
        } else {
            self.state.running = true;
            self.start_ticking();
            info!("Timer started at {}", self.state.formatted_remaining());
        }
    }

    /// Starts the countdown if it is paused. Returns true if it started.
    pub fn start_if_paused(&mut self) -> bool {
        if self.state.running {
            false
        } else {
            self.toggle_run();
            true
        }
    }

    /// Pauses the countdown if it is running. Returns true if it paused.
    pub fn pause_if_running(&mut self) -> bool {
        if self.state.running {
            self.toggle_run();
            true
        } else {
            false
        }
    }

    /// Switches to the opposite mode and loads its duration from the store.
    ///
    /// A running countdown keeps running in the new mode. If the store
    /// fails, mode and remaining seconds are kept and the engine is left
    /// paused; the failure is logged but not alerted.
    pub async fn switch_mode(&mut self) -> Result<(), EngineError> {
        let was_running = self.state.running;
        self.cancel_tick();

        let next = self.state.mode.opposite();
        match self.store.get_one(next.duration_key()).await {
            Ok(duration) => {
                self.state.seconds_remaining = duration;
                self.state.mode = next;
                if was_running {
                    self.start_ticking();
                }
                info!(
                    "Switched to {} mode ({} seconds)",
                    next.as_str(),
                    duration
                );
                Ok(())
            }
            Err(e) => {
                error!("Error getting setting {}: {}", next.duration_key(), e);
                self.state.running = false;
                Err(e.into())
            }
        }
    }

    /// Resets the countdown to the full cached duration of the current mode.
    pub fn replay(&mut self) {
        self.state.seconds_remaining = self.settings.duration_for(self.state.mode);
        info!(
            "Replaying {} mode from {}",
            self.state.mode.as_str(),
            self.state.formatted_remaining()
        );
    }

    /// Loads all settings and resets to a paused work countdown.
    pub async fn reset_to_work_duration(&mut self) -> Result<(), EngineError> {
        self.cancel_tick();
        self.state.running = false;

        let settings = self
            .fetch_settings()
            .await
            .ok_or(EngineError::SettingsUnavailable)?;

        self.state.mode = TimerMode::Work;
        self.state.seconds_remaining = settings.work_duration;
        debug!("Settings: {:?}", settings);
        Ok(())
    }

    /// Fetches all settings and refreshes the cache.
    ///
    /// On failure an error alert is raised and `None` is returned.
    pub async fn fetch_settings(&mut self) -> Option<Settings> {
        match self.store.get_all().await {
            Ok(settings) => {
                self.settings = settings.clone();
                Some(settings)
            }
            Err(e) => {
                self.report_error(&e);
                None
            }
        }
    }

    /// Fetches a single duration setting. The cache is not touched.
    ///
    /// On failure an error alert is raised and `None` is returned.
    pub async fn fetch_one_setting(&self, name: &str) -> Option<u32> {
        match self.store.get_one(name).await {
            Ok(value) => Some(value),
            Err(e) if e.is_lookup_error() => {
                warn!("{}", e);
                self.notifier.alert(AlertKind::Error, &e.to_string());
                None
            }
            Err(e) => {
                self.report_error(&e);
                None
            }
        }
    }

    /// Writes a settings update through the store.
    ///
    /// Only a [`STATUS_OK`] answer refreshes the cache from the store and
    /// shows the "settings updated" tray message. Any other status or error leaves the
    /// cache as it was and raises an error alert.
    pub async fn update_settings(&mut self, patch: SettingsPatch) -> Result<(), EngineError> {
        match self.store.update(&patch).await {
            Ok(STATUS_OK) => {
                match self.store.get_all().await {
                    Ok(settings) => self.settings = settings,
                    Err(e) => {
                        warn!("Could not reload settings after update: {}", e);
                        self.settings.apply(&patch);
                    }
                }
                self.notifier
                    .tray_message(TrayMessage::info(SETTINGS_UPDATED_MESSAGE));
                info!("Settings updated");
                Ok(())
            }
            Ok(status) => {
                warn!("Settings store rejected update with status {}", status);
                self.notifier.alert(
                    AlertKind::Error,
                    &format!("Settings were not saved (status {}).", status),
                );
                Err(EngineError::UpdateRejected(status))
            }
            Err(e) => {
                self.report_error(&e);
                Err(e.into())
            }
        }
    }

    fn report_error(&self, err: &dyn std::error::Error) {
        error!("{}", err);
        self.notifier.alert(AlertKind::Error, &err.to_string());
    }

    /// Returns a mutable reference to the timer state (for testing).
    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut TimerState {
        &mut self.state
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::Value;

    use crate::notification::MockNotificationBridge;
    use crate::settings::MockSettingsStore;

    type TestEngine = TimerEngine<Arc<MockSettingsStore>, Arc<MockNotificationBridge>>;

    struct Fixture {
        engine: TestEngine,
        store: Arc<MockSettingsStore>,
        notifier: Arc<MockNotificationBridge>,
        rx: mpsc::UnboundedReceiver<TickSignal>,
    }

    fn create_engine_with_settings(settings: Settings) -> Fixture {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Arc::new(MockSettingsStore::new(settings));
        let notifier = Arc::new(MockNotificationBridge::new());
        let engine = TimerEngine::new(Arc::clone(&store), Arc::clone(&notifier), tx);
        Fixture {
            engine,
            store,
            notifier,
            rx,
        }
    }

    fn create_engine() -> Fixture {
        create_engine_with_settings(Settings::new(25 * 60, 5 * 60))
    }

    async fn create_initialized_engine() -> Fixture {
        let mut fixture = create_engine();
        fixture.engine.reset_to_work_duration().await.unwrap();
        fixture
    }

    fn assert_handle_invariant(engine: &TestEngine) {
        assert_eq!(engine.has_active_tick(), engine.state().running);
    }

    // ------------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------------

    mod init_tests {
        use super::*;

        #[test]
        fn test_new_engine() {
            let fixture = create_engine();
            let state = fixture.engine.state();

            assert_eq!(state.seconds_remaining, 0);
            assert_eq!(state.mode, TimerMode::Work);
            assert!(!state.running);
            assert!(!fixture.engine.has_active_tick());
        }

        #[tokio::test]
        async fn test_reset_to_work_duration() {
            let fixture = create_initialized_engine().await;
            let state = fixture.engine.state();

            assert_eq!(state.seconds_remaining, 1500);
            assert_eq!(state.mode, TimerMode::Work);
            assert!(!state.running);
            assert_eq!(fixture.engine.settings(), &Settings::new(1500, 300));
        }

        #[tokio::test]
        async fn test_reset_stops_running_rest_countdown() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.switch_mode().await.unwrap();
            fixture.engine.toggle_run();

            fixture.engine.reset_to_work_duration().await.unwrap();

            assert_eq!(fixture.engine.state().mode, TimerMode::Work);
            assert_eq!(fixture.engine.state().seconds_remaining, 1500);
            assert!(!fixture.engine.state().running);
            assert_handle_invariant(&fixture.engine);
        }

        #[tokio::test]
        async fn test_reset_fails_when_store_unreadable() {
            let mut fixture = create_engine();
            fixture.store.set_should_fail_reads(true);

            let result = fixture.engine.reset_to_work_duration().await;

            assert!(matches!(result, Err(EngineError::SettingsUnavailable)));
            assert_eq!(fixture.engine.state().seconds_remaining, 0);
            assert_eq!(fixture.notifier.error_alert_count(), 1);
        }
    }

    // ------------------------------------------------------------------------
    // Start / pause
    // ------------------------------------------------------------------------

    mod toggle_tests {
        use super::*;

        #[tokio::test]
        async fn test_toggle_starts_and_pauses() {
            let mut fixture = create_initialized_engine().await;

            fixture.engine.toggle_run();
            assert!(fixture.engine.state().running);
            assert!(fixture.engine.has_active_tick());

            fixture.engine.toggle_run();
            assert!(!fixture.engine.state().running);
            assert!(!fixture.engine.has_active_tick());
        }

        #[tokio::test]
        async fn test_each_start_uses_new_generation() {
            let mut fixture = create_initialized_engine().await;

            fixture.engine.toggle_run();
            let first = fixture.engine.active_generation().unwrap();
            fixture.engine.toggle_run();
            fixture.engine.toggle_run();
            let second = fixture.engine.active_generation().unwrap();

            assert!(second > first);
        }

        #[tokio::test]
        async fn test_start_if_paused_when_running_is_noop() {
            let mut fixture = create_initialized_engine().await;

            assert!(fixture.engine.start_if_paused());
            let generation = fixture.engine.active_generation();
            let before = fixture.engine.state().clone();

            assert!(!fixture.engine.start_if_paused());

            assert!(fixture.engine.state().running);
            assert_eq!(fixture.engine.state(), &before);
            assert_eq!(fixture.engine.active_generation(), generation);
        }

        #[tokio::test]
        async fn test_pause_if_running_when_paused_is_noop() {
            let mut fixture = create_initialized_engine().await;
            let before = fixture.engine.state().clone();

            assert!(!fixture.engine.pause_if_running());

            assert_eq!(fixture.engine.state(), &before);
            assert!(!fixture.engine.has_active_tick());
        }

        #[tokio::test]
        async fn test_pause_if_running_pauses() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.toggle_run();

            assert!(fixture.engine.pause_if_running());

            assert!(!fixture.engine.state().running);
            assert_handle_invariant(&fixture.engine);
        }

        #[tokio::test]
        async fn test_start_with_zero_remaining_exhausts_on_next_tick() {
            let mut fixture = create_engine();

            fixture.engine.toggle_run();
            assert!(fixture.engine.state().running);

            let exhausted = fixture.engine.tick();

            assert!(exhausted);
            assert_eq!(fixture.engine.state().seconds_remaining, 0);
            assert!(!fixture.engine.state().running);
            assert_handle_invariant(&fixture.engine);
        }
    }

    // ------------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------------

    mod tick_tests {
        use super::*;

        #[tokio::test]
        async fn test_three_ticks() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.toggle_run();

            for _ in 0..3 {
                assert!(!fixture.engine.tick());
            }

            assert_eq!(fixture.engine.state().seconds_remaining, 1497);
            assert!(fixture.engine.state().running);
        }

        #[tokio::test]
        async fn test_last_second_auto_pauses() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.state_mut().seconds_remaining = 1;
            fixture.engine.toggle_run();

            let exhausted = fixture.engine.tick();

            assert!(exhausted);
            assert_eq!(fixture.engine.state().seconds_remaining, 0);
            assert!(!fixture.engine.state().running);
            assert!(!fixture.engine.has_active_tick());
        }

        #[tokio::test]
        async fn test_no_decrement_after_exhaustion() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.state_mut().seconds_remaining = 2;
            fixture.engine.toggle_run();

            fixture.engine.tick();
            fixture.engine.tick();
            for _ in 0..5 {
                assert!(!fixture.engine.tick());
            }

            assert_eq!(fixture.engine.state().seconds_remaining, 0);
            assert!(!fixture.engine.state().running);
        }

        #[tokio::test]
        async fn test_tick_while_paused_does_nothing() {
            let mut fixture = create_initialized_engine().await;

            fixture.engine.tick();

            assert_eq!(fixture.engine.state().seconds_remaining, 1500);
        }

        #[tokio::test]
        async fn test_remaining_is_monotonic() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.state_mut().seconds_remaining = 10;
            fixture.engine.toggle_run();

            let mut previous = fixture.engine.state().seconds_remaining;
            for step in 0..40 {
                // Interleave pauses and restarts with ticks
                if step % 7 == 3 {
                    fixture.engine.toggle_run();
                }
                fixture.engine.tick();

                let current = fixture.engine.state().seconds_remaining;
                assert!(current <= previous, "step {}: {} > {}", step, current, previous);
                previous = current;
                assert_handle_invariant(&fixture.engine);
            }
        }

        #[tokio::test]
        async fn test_stale_signal_is_ignored() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.toggle_run();
            let old = fixture.engine.active_generation().unwrap();
            fixture.engine.toggle_run();
            fixture.engine.toggle_run();

            let applied = fixture.engine.on_tick(TickSignal { generation: old });

            assert!(!applied);
            assert_eq!(fixture.engine.state().seconds_remaining, 1500);
        }

        #[tokio::test]
        async fn test_signal_while_paused_is_ignored() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.toggle_run();
            let generation = fixture.engine.active_generation().unwrap();
            fixture.engine.toggle_run();

            assert!(!fixture.engine.on_tick(TickSignal { generation }));
            assert_eq!(fixture.engine.state().seconds_remaining, 1500);
        }

        #[tokio::test]
        async fn test_current_signal_is_applied() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.toggle_run();
            let generation = fixture.engine.active_generation().unwrap();

            assert!(fixture.engine.on_tick(TickSignal { generation }));
            assert_eq!(fixture.engine.state().seconds_remaining, 1499);
        }

        #[tokio::test]
        async fn test_elapsed_tray_message_when_enabled() {
            let settings =
                Settings::new(1500, 300).with_extra(TRAY_MSG_WHEN_ELAPSED, Value::Bool(true));
            let mut fixture = create_engine_with_settings(settings);
            fixture.engine.reset_to_work_duration().await.unwrap();
            fixture.engine.state_mut().seconds_remaining = 1;
            fixture.engine.toggle_run();

            fixture.engine.tick();

            let messages = fixture.notifier.tray_messages();
            assert_eq!(messages.len(), 1);
            assert!(messages[0].content.contains("resting"));
        }

        #[tokio::test]
        async fn test_elapsed_tray_flag_picked_up_on_refresh() {
            let mut fixture = create_initialized_engine().await;
            fixture.store.set_value(TRAY_MSG_WHEN_ELAPSED, Value::Bool(true));
            fixture.engine.fetch_settings().await.unwrap();
            fixture.engine.state_mut().seconds_remaining = 1;
            fixture.engine.toggle_run();

            fixture.engine.tick();

            assert_eq!(fixture.notifier.tray_messages().len(), 1);
        }

        #[tokio::test]
        async fn test_no_elapsed_tray_message_by_default() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.state_mut().seconds_remaining = 1;
            fixture.engine.toggle_run();

            fixture.engine.tick();

            assert!(fixture.notifier.tray_messages().is_empty());
        }
    }

    // ------------------------------------------------------------------------
    // Mode switching and replay
    // ------------------------------------------------------------------------

    mod switch_tests {
        use super::*;

        #[tokio::test]
        async fn test_switch_keeps_running() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.toggle_run();
            for _ in 0..3 {
                fixture.engine.tick();
            }
            let old_generation = fixture.engine.active_generation().unwrap();

            fixture.engine.switch_mode().await.unwrap();

            let state = fixture.engine.state();
            assert_eq!(state.seconds_remaining, 300);
            assert_eq!(state.mode, TimerMode::Rest);
            assert!(state.running);
            assert_ne!(fixture.engine.active_generation(), Some(old_generation));

            fixture.engine.tick();
            assert_eq!(fixture.engine.state().seconds_remaining, 299);
        }

        #[tokio::test]
        async fn test_switch_while_paused_stays_paused() {
            let mut fixture = create_initialized_engine().await;

            fixture.engine.switch_mode().await.unwrap();

            assert_eq!(fixture.engine.state().mode, TimerMode::Rest);
            assert!(!fixture.engine.state().running);
            assert!(!fixture.engine.has_active_tick());
        }

        #[tokio::test]
        async fn test_switch_round_trip() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.toggle_run();
            fixture.engine.tick();

            fixture.engine.switch_mode().await.unwrap();
            fixture.engine.switch_mode().await.unwrap();

            assert_eq!(fixture.engine.state().mode, TimerMode::Work);
            assert_eq!(fixture.engine.state().seconds_remaining, 1500);
            assert!(fixture.engine.state().running);
        }

        #[tokio::test]
        async fn test_switch_reads_store_not_cache() {
            let mut fixture = create_initialized_engine().await;
            fixture.store.set_settings(Settings::new(1500, 42));

            fixture.engine.switch_mode().await.unwrap();

            assert_eq!(fixture.engine.state().seconds_remaining, 42);
        }

        #[tokio::test]
        async fn test_switch_failure_keeps_mode_and_pauses() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.toggle_run();
            fixture.engine.tick();
            fixture.store.set_should_fail_reads(true);

            let result = fixture.engine.switch_mode().await;

            assert!(matches!(result, Err(EngineError::Settings(_))));
            let state = fixture.engine.state();
            assert_eq!(state.mode, TimerMode::Work);
            assert_eq!(state.seconds_remaining, 1499);
            assert!(!state.running);
            assert_handle_invariant(&fixture.engine);
            // Logged only
            assert!(fixture.notifier.alerts().is_empty());
        }

        #[tokio::test]
        async fn test_replay_resets_current_mode() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.toggle_run();
            for _ in 0..10 {
                fixture.engine.tick();
            }

            fixture.engine.replay();

            assert_eq!(fixture.engine.state().seconds_remaining, 1500);
            assert_eq!(fixture.engine.state().mode, TimerMode::Work);
            assert!(fixture.engine.state().running);
        }

        #[tokio::test]
        async fn test_replay_in_rest_mode_uses_cached_rest_duration() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine.switch_mode().await.unwrap();
            fixture.engine.state_mut().seconds_remaining = 0;

            fixture.engine.replay();

            assert_eq!(fixture.engine.state().seconds_remaining, 300);
            assert!(!fixture.engine.state().running);
        }
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    mod settings_tests {
        use super::*;

        #[tokio::test]
        async fn test_fetch_settings_refreshes_cache() {
            let mut fixture = create_initialized_engine().await;
            fixture.store.set_settings(Settings::new(100, 50));

            let fetched = fixture.engine.fetch_settings().await;

            assert_eq!(fetched, Some(Settings::new(100, 50)));
            assert_eq!(fixture.engine.settings(), &Settings::new(100, 50));
        }

        #[tokio::test]
        async fn test_fetch_settings_failure_alerts_and_keeps_cache() {
            let mut fixture = create_initialized_engine().await;
            fixture.store.set_should_fail_reads(true);

            let fetched = fixture.engine.fetch_settings().await;

            assert!(fetched.is_none());
            assert_eq!(fixture.engine.settings(), &Settings::new(1500, 300));
            let alerts = fixture.notifier.alerts();
            assert_eq!(alerts.len(), 1);
            assert_eq!(alerts[0].0, AlertKind::Error);
        }

        #[tokio::test]
        async fn test_fetch_one_setting() {
            let fixture = create_initialized_engine().await;

            assert_eq!(fixture.engine.fetch_one_setting("restDuration").await, Some(300));
        }

        #[tokio::test]
        async fn test_fetch_one_unknown_setting_alerts() {
            let fixture = create_initialized_engine().await;

            assert_eq!(fixture.engine.fetch_one_setting("nope").await, None);
            assert_eq!(fixture.notifier.error_alert_count(), 1);
        }

        #[tokio::test]
        async fn test_update_success() {
            let mut fixture = create_initialized_engine().await;
            let patch = SettingsPatch::default().with_work_duration(50 * 60);

            fixture.engine.update_settings(patch).await.unwrap();

            assert_eq!(fixture.engine.settings().work_duration, 3000);
            assert_eq!(fixture.engine.settings().rest_duration, 300);
            assert_eq!(
                fixture.notifier.tray_messages(),
                vec![TrayMessage::info(SETTINGS_UPDATED_MESSAGE)]
            );
            assert!(fixture.notifier.alerts().is_empty());
        }

        #[tokio::test]
        async fn test_update_then_replay_uses_new_duration() {
            let mut fixture = create_initialized_engine().await;

            fixture
                .engine
                .update_settings(SettingsPatch::default().with_work_duration(600))
                .await
                .unwrap();
            fixture.engine.replay();

            assert_eq!(fixture.engine.state().seconds_remaining, 600);
        }

        #[tokio::test]
        async fn test_update_reloads_cache_from_store() {
            let mut fixture = create_initialized_engine().await;
            fixture.store.set_settings(Settings::new(1500, 42));

            fixture
                .engine
                .update_settings(SettingsPatch::default().with_work_duration(600))
                .await
                .unwrap();

            assert_eq!(fixture.engine.settings(), &fixture.store.stored());
            assert_eq!(fixture.engine.settings().rest_duration, 42);
        }

        #[tokio::test]
        async fn test_update_non_zero_status_keeps_cache() {
            let mut fixture = create_initialized_engine().await;
            fixture.store.set_update_status(2);

            let result = fixture
                .engine
                .update_settings(SettingsPatch::default().with_work_duration(60))
                .await;

            assert!(matches!(result, Err(EngineError::UpdateRejected(2))));
            assert_eq!(fixture.engine.settings(), &Settings::new(1500, 300));
            assert!(fixture.notifier.tray_messages().is_empty());
            assert_eq!(fixture.notifier.error_alert_count(), 1);
        }

        #[tokio::test]
        async fn test_update_error_keeps_cache() {
            let mut fixture = create_initialized_engine().await;
            fixture.store.set_should_fail_updates(true);

            let result = fixture
                .engine
                .update_settings(SettingsPatch::default().with_rest_duration(60))
                .await;

            assert!(matches!(result, Err(EngineError::Settings(_))));
            assert_eq!(fixture.engine.settings().rest_duration, 300);
            assert!(fixture.notifier.tray_messages().is_empty());
            assert_eq!(fixture.notifier.error_alert_count(), 1);
        }
    }

    // ------------------------------------------------------------------------
    // Tick task with Tokio runtime
    // ------------------------------------------------------------------------

    mod tick_task_tests {
        use super::*;
        use tokio::time::timeout;

        #[tokio::test]
        async fn test_tick_task_sends_signals() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine = fixture.engine.with_tick_period(Duration::from_millis(20));
            fixture.engine.toggle_run();
            let generation = fixture.engine.active_generation().unwrap();

            let signal = timeout(Duration::from_secs(2), fixture.rx.recv())
                .await
                .expect("tick signal expected")
                .unwrap();

            assert_eq!(signal.generation, generation);
            assert!(fixture.engine.on_tick(signal));
            assert_eq!(fixture.engine.state().seconds_remaining, 1499);
        }

        #[tokio::test]
        async fn test_no_signals_while_paused() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine = fixture.engine.with_tick_period(Duration::from_millis(20));
            fixture.engine.toggle_run();
            fixture.engine.toggle_run();

            // Drain anything sent before the abort took effect
            tokio::time::sleep(Duration::from_millis(100)).await;
            while fixture.rx.try_recv().is_ok() {}

            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(fixture.rx.try_recv().is_err());
        }

        #[tokio::test]
        async fn test_countdown_runs_to_zero() {
            let mut fixture = create_initialized_engine().await;
            fixture.engine = fixture.engine.with_tick_period(Duration::from_millis(10));
            fixture.engine.state_mut().seconds_remaining = 3;
            fixture.engine.toggle_run();

            let result = timeout(Duration::from_secs(2), async {
                while fixture.engine.state().running {
                    let signal = fixture.rx.recv().await.unwrap();
                    fixture.engine.on_tick(signal);
                }
            })
            .await;

            assert!(result.is_ok(), "countdown should finish");
            assert_eq!(fixture.engine.state().seconds_remaining, 0);
            assert!(!fixture.engine.has_active_tick());
        }
    }
}
