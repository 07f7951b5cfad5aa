//! Timer engine implementation.
//!
//! The engine tracks four recurring cadences on a monotonic clock and asks a
//! [`FireHandler`] to surface a reminder when one comes due. It can run its
//! own one-second loop on the tokio runtime ([`TimerEngine::start`]) or be
//! driven by the host through [`TimerEngine::tick`].
//!
//! ## Suspend reasons
//!
//! ```text
//! paused (user, timed)   popup_paused (coordinator)
//!        \                    /
//!         +--> either set: ticks fire nothing
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let engine = TimerEngine::new(config, last_break);
//! let popups = PopupCoordinator::spawn(engine.clone(), display, engine.events());
//! engine.start(popups);
//! ```

use chrono::{DateTime, Local, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use super::kind::EventKind;
use super::state::{EngineSnapshot, EngineState, TickOutcome};
use crate::events::{Event, EventBus};
use crate::popup::PopupGate;
use crate::storage::Config;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Minutes a bare "pause" lasts.
pub const DEFAULT_PAUSE_MINUTES: u32 = 30;

/// Receives due reminders. Called from the engine's loop, outside its lock;
/// implementations must not block.
pub trait FireHandler: Send + Sync + 'static {
    fn on_fire(&self, kind: EventKind);
}

impl<F> FireHandler for F
where
    F: Fn(EventKind) + Send + Sync + 'static,
{
    fn on_fire(&self, kind: EventKind) {
        self(kind)
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<EngineState>,
    /// Swapped wholesale so a tick never sees half an update.
    config: RwLock<Arc<Config>>,
    running: AtomicBool,
    /// Bumped by every `start` so a loop from an earlier run exits.
    generation: AtomicU64,
    events: EventBus,
}

/// Recurring reminder scheduler.
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    shared: Arc<Shared>,
}

impl TimerEngine {
    /// Create an engine, continuing from the last break of a previous
    /// session when there was one.
    pub fn new(config: Config, last_break: Option<DateTime<Utc>>) -> Self {
        Self::with_events(config, last_break, EventBus::new())
    }

    pub fn with_events(
        config: Config,
        last_break: Option<DateTime<Utc>>,
        events: EventBus,
    ) -> Self {
        // A timestamp in the future counts as a break taken just now.
        let since_last_break =
            last_break.map(|at| (Utc::now() - at).to_std().unwrap_or(Duration::ZERO));
        let state = EngineState::seeded(Instant::now(), since_last_break, &config);
        debug!(?since_last_break, "timer engine created");
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                config: RwLock::new(Arc::new(config)),
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn events(&self) -> EventBus {
        self.shared.events.clone()
    }

    pub fn config(&self) -> Arc<Config> {
        self.shared
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.state().is_paused()
    }

    pub fn is_popup_paused(&self) -> bool {
        self.state().is_popup_paused()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let config = self.config();
        let mut snapshot = self
            .state()
            .snapshot(Instant::now(), &local_clock(), &config);
        snapshot.running = self.is_running();
        snapshot
    }

    /// Whether the big break that just fired should include the eye exercise.
    ///
    /// Read-clears: the first call after a merged big break returns `true`,
    /// every later call `false` until the next merge. Call it exactly once
    /// per big-break popup.
    pub fn include_eyes_in_big_break(&self) -> bool {
        self.state().take_include_eyes()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Spawn the one-second loop on the current tokio runtime.
    ///
    /// Water and eye cadences restart now. Returns `None` if the engine is
    /// already running.
    pub fn start<H: FireHandler>(&self, handler: H) -> Option<JoinHandle<()>> {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return None;
        }
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let now = Instant::now();
            let mut state = self.state();
            state.reset(EventKind::WaterReminder, now);
            state.reset(EventKind::EyeExercise, now);
        }
        info!("scheduler started");

        let engine = self.clone();
        Some(tokio::spawn(async move {
            engine.run(generation, handler).await;
        }))
    }

    /// Ask the loop to exit. It notices on its next wake.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            info!("scheduler stopping");
        }
    }

    pub fn pause(&self, minutes: u32) {
        self.state().pause(Instant::now(), minutes);
        info!(minutes, "scheduler paused");
        self.shared.events.publish(Event::SchedulerPaused {
            minutes,
            at: Utc::now(),
        });
    }

    /// Lift a timed pause and restart every cadence from now.
    pub fn resume(&self) {
        self.state().resume(Instant::now());
        info!("scheduler resumed");
        self.shared
            .events
            .publish(Event::SchedulerResumed { at: Utc::now() });
    }

    pub fn toggle_pause(&self, paused: bool) {
        if paused {
            self.pause(DEFAULT_PAUSE_MINUTES);
        } else {
            self.resume();
        }
    }

    /// Replace the configuration; the next tick uses it.
    pub fn update_config(&self, config: Config) {
        *self
            .shared
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
        info!("scheduler configuration updated");
    }

    /// Evaluate the cadences once and hand anything due to `handler`.
    pub fn tick<H: FireHandler + ?Sized>(&self, handler: &H) -> TickOutcome {
        let config = self.config();
        let outcome = self
            .state()
            .tick(Instant::now(), &local_clock(), &config);
        self.report(&outcome);
        for kind in outcome.fired() {
            handler.on_fire(*kind);
        }
        outcome
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn run<H: FireHandler>(self, generation: u64, handler: H) {
        let mut ticker = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !self.is_running() || self.shared.generation.load(Ordering::SeqCst) != generation {
                break;
            }
            self.tick(&handler);
        }
        info!("scheduler loop exited");
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, outcome: &TickOutcome) {
        let at = Utc::now();
        match outcome {
            TickOutcome::PauseExpired => {
                info!("pause expired, scheduler resumed");
                self.shared.events.publish(Event::SchedulerResumed { at });
            }
            TickOutcome::Evaluated {
                fired,
                suppressed,
                merged_eyes,
            } => {
                for kind in fired {
                    let merged_eyes = *merged_eyes && *kind == EventKind::BigBreak;
                    info!(%kind, merged_eyes, "reminder due");
                    self.shared.events.publish(Event::ReminderFired {
                        kind: *kind,
                        merged_eyes,
                        at,
                    });
                }
                for (kind, reason) in suppressed {
                    debug!(%kind, ?reason, "reminder held back by protection zone");
                    self.shared.events.publish(Event::ReminderSuppressed {
                        kind: *kind,
                        reason: *reason,
                        at,
                    });
                }
            }
            other => trace!(?other, "tick skipped"),
        }
    }
}

impl PopupGate for TimerEngine {
    fn pause_for_popup(&self) {
        self.state().pause_for_popup();
        debug!("cadences suspended while a popup is visible");
    }

    fn resume_after_popup(&self) {
        self.state().resume_after_popup(Instant::now());
        debug!("popups drained, cadences restarted");
    }
}

fn local_clock() -> String {
    Local::now().format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn quick_config() -> Config {
        Config {
            small_break_interval_min: 1,
            big_break_interval_min: 60,
            eye_exercise_interval_min: 30,
            water_interval_min: 30,
            ..Config::default()
        }
    }

    fn recorder() -> (Arc<StdMutex<Vec<EventKind>>>, impl FireHandler) {
        let fired = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        (fired, move |kind: EventKind| sink.lock().unwrap().push(kind))
    }

    #[tokio::test(start_paused = true)]
    async fn loop_fires_due_reminders() {
        let engine = TimerEngine::new(quick_config(), None);
        let (fired, handler) = recorder();
        assert!(engine.start(handler).is_some());
        assert!(engine.is_running());

        time::sleep(Duration::from_secs(61)).await;
        assert_eq!(*fired.lock().unwrap(), vec![EventKind::SmallBreak]);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_rejected() {
        let engine = TimerEngine::new(quick_config(), None);
        let (_, first) = recorder();
        let (_, second) = recorder();
        assert!(engine.start(first).is_some());
        assert!(engine.start(second).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_loop() {
        let engine = TimerEngine::new(quick_config(), None);
        let (fired, handler) = recorder();
        let handle = engine.start(handler).unwrap();
        engine.stop();
        handle.await.unwrap();

        time::sleep(Duration::from_secs(300)).await;
        assert!(fired.lock().unwrap().is_empty());
        assert!(!engine.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_suppresses_fires_until_it_expires() {
        let engine = TimerEngine::new(quick_config(), None);
        let (fired, handler) = recorder();
        engine.start(handler);
        engine.pause(30);
        assert!(engine.is_paused());

        time::sleep(Duration::from_secs(30 * 60 - 1)).await;
        assert!(fired.lock().unwrap().is_empty());

        time::sleep(Duration::from_secs(2)).await;
        assert!(!engine.is_paused());
        let snap = engine.snapshot();
        assert!(snap.time_to_small_break > 58.0 && snap.time_to_small_break <= 60.0);
        assert!(fired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_pause_round_trip() {
        let engine = TimerEngine::new(quick_config(), None);
        engine.toggle_pause(true);
        assert!(engine.is_paused());
        engine.toggle_pause(false);
        assert!(!engine.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn update_config_applies_on_next_tick() {
        let engine = TimerEngine::new(quick_config(), None);
        let (fired, handler) = recorder();
        engine.start(handler);
        engine.update_config(Config {
            small_break_interval_min: 5,
            ..quick_config()
        });

        time::sleep(Duration::from_secs(61)).await;
        assert!(fired.lock().unwrap().is_empty());
        assert_eq!(engine.config().small_break_interval_min, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn popup_gate_freezes_and_restarts_cadences() {
        let engine = TimerEngine::new(quick_config(), None);
        let (fired, handler) = recorder();
        engine.start(handler);

        engine.pause_for_popup();
        time::sleep(Duration::from_secs(120)).await;
        assert!(fired.lock().unwrap().is_empty());
        assert!(engine.snapshot().popup_paused);

        engine.resume_after_popup();
        let snap = engine.snapshot();
        assert!(!snap.popup_paused);
        assert_eq!(snap.time_to_small_break, 60.0);
    }

    #[tokio::test(start_paused = true)]
    async fn merged_big_break_flag_is_consumed_once() {
        let engine = TimerEngine::new(
            Config {
                small_break_interval_min: 90,
                big_break_interval_min: 2,
                eye_exercise_interval_min: 3,
                water_interval_min: 90,
                ..Config::default()
            },
            None,
        );
        let (fired, handler) = recorder();
        engine.start(handler);

        time::sleep(Duration::from_secs(121)).await;
        assert_eq!(*fired.lock().unwrap(), vec![EventKind::BigBreak]);
        assert!(engine.include_eyes_in_big_break());
        assert!(!engine.include_eyes_in_big_break());
    }

    #[tokio::test(start_paused = true)]
    async fn fires_are_published_on_the_bus() {
        let engine = TimerEngine::new(quick_config(), None);
        let mut rx = engine.events().subscribe();
        let (_, handler) = recorder();
        engine.start(handler);

        time::sleep(Duration::from_secs(61)).await;
        match rx.recv().await.unwrap() {
            Event::ReminderFired { kind, merged_eyes, .. } => {
                assert_eq!(kind, EventKind::SmallBreak);
                assert!(!merged_eyes);
            }
            other => panic!("expected ReminderFired, got {other:?}"),
        }
    }

    /// Move the paused clock far from process start so seeding can rewind.
    async fn settle_clock() {
        time::advance(Duration::from_secs(24 * 60 * 60)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn previous_session_seeds_break_clocks() {
        settle_clock().await;
        let last_break = Utc::now() - chrono::Duration::minutes(25);
        let engine = TimerEngine::new(Config::default(), Some(last_break));
        let snap = engine.snapshot();
        // 5 minutes overdue: startup grace instead of an immediate break.
        assert!(snap.time_to_small_break > 299.0 && snap.time_to_small_break <= 300.0);
        assert!(snap.time_to_big_break > 2099.0 && snap.time_to_big_break <= 2100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn long_absence_starts_fresh() {
        settle_clock().await;
        let last_break = Utc::now() - chrono::Duration::minutes(45);
        let snap = TimerEngine::new(Config::default(), Some(last_break)).snapshot();
        assert!(snap.time_to_small_break > 1199.0);
        assert!(snap.time_to_big_break > 3599.0);
    }
}
