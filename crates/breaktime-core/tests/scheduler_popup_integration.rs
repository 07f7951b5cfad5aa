//! Integration tests for the engine driving the popup coordinator.
//!
//! Runs the real one-second loop on a paused tokio clock with a display that
//! closes every popup after a fixed time, the way a popup window with a
//! countdown would.

use std::sync::{Arc, Mutex};

use breaktime_core::{
    CloseHandle, Config, DisplayError, Event, EventKind, PopupCoordinator, PopupDisplay,
    TimerEngine,
};
use tokio::time::{self, Duration};

#[derive(Debug, Clone, PartialEq)]
struct Shown {
    kind: EventKind,
    with_eyes: bool,
}

#[derive(Clone)]
struct AutoCloseDisplay {
    engine: TimerEngine,
    hold: Duration,
    shown: Arc<Mutex<Vec<Shown>>>,
}

impl AutoCloseDisplay {
    fn new(engine: &TimerEngine, hold: Duration) -> Self {
        Self {
            engine: engine.clone(),
            hold,
            shown: Arc::default(),
        }
    }

    fn shown(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }
}

impl PopupDisplay for AutoCloseDisplay {
    fn show(&self, kind: EventKind, on_close: CloseHandle) -> Result<(), DisplayError> {
        let with_eyes = kind == EventKind::BigBreak && self.engine.include_eyes_in_big_break();
        self.shown.lock().unwrap().push(Shown { kind, with_eyes });
        let hold = self.hold;
        tokio::spawn(async move {
            time::sleep(hold).await;
            on_close.close();
        });
        Ok(())
    }
}

fn wire(config: Config, hold: Duration) -> (TimerEngine, PopupCoordinator, AutoCloseDisplay) {
    let engine = TimerEngine::new(config, None);
    let display = AutoCloseDisplay::new(&engine, hold);
    let coordinator = PopupCoordinator::spawn(engine.clone(), display.clone(), engine.events());
    engine.start(coordinator.clone());
    (engine, coordinator, display)
}

#[tokio::test(start_paused = true)]
async fn test_visible_popup_freezes_cadences_until_closed() {
    let config = Config {
        small_break_interval_min: 1,
        big_break_interval_min: 60,
        ..Config::default()
    };
    let (engine, coordinator, display) = wire(config, Duration::from_secs(10));

    time::sleep(Duration::from_secs(61)).await;
    let snap = coordinator.inspect().await.unwrap();
    assert_eq!(snap.active, Some(EventKind::SmallBreak));
    assert!(engine.is_popup_paused());

    time::sleep(Duration::from_secs(10)).await;
    assert!(!engine.is_popup_paused());
    assert_eq!(coordinator.inspect().await.unwrap().active, None);

    // Every cadence restarted when the popup closed at 70 s.
    let snap = engine.snapshot();
    assert!(snap.time_to_small_break > 58.0 && snap.time_to_small_break <= 60.0);
    assert!(snap.time_to_big_break > 3598.0);
    assert_eq!(
        display.shown(),
        vec![Shown {
            kind: EventKind::SmallBreak,
            with_eyes: false
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_reminders_are_shown_one_after_another() {
    let config = Config {
        small_break_interval_min: 30,
        big_break_interval_min: 60,
        eye_exercise_interval_min: 1,
        water_interval_min: 1,
        ..Config::default()
    };
    let (engine, coordinator, display) = wire(config, Duration::from_secs(5));
    let mut rx = engine.events().subscribe();

    time::sleep(Duration::from_secs(61)).await;
    let snap = coordinator.inspect().await.unwrap();
    assert_eq!(snap.active, Some(EventKind::EyeExercise));
    assert_eq!(snap.queue, vec![EventKind::WaterReminder]);

    time::sleep(Duration::from_secs(10)).await;
    let kinds: Vec<_> = display.shown().into_iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![EventKind::EyeExercise, EventKind::WaterReminder]);
    assert!(!engine.is_popup_paused());

    let mut fired = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::ReminderFired { kind, .. } = event {
            fired.push(kind);
        }
    }
    assert_eq!(fired, vec![EventKind::EyeExercise, EventKind::WaterReminder]);
}

#[tokio::test(start_paused = true)]
async fn test_merged_big_break_reaches_the_display() {
    let config = Config {
        small_break_interval_min: 90,
        big_break_interval_min: 2,
        eye_exercise_interval_min: 3,
        water_interval_min: 90,
        ..Config::default()
    };
    let (engine, _coordinator, display) = wire(config, Duration::from_secs(5));

    time::sleep(Duration::from_secs(121)).await;
    assert_eq!(
        display.shown(),
        vec![Shown {
            kind: EventKind::BigBreak,
            with_eyes: true
        }]
    );
    // The flag was consumed by the popup.
    assert!(!engine.include_eyes_in_big_break());
}

#[tokio::test(start_paused = true)]
async fn test_paused_engine_shows_nothing() {
    let config = Config {
        small_break_interval_min: 1,
        ..Config::default()
    };
    let (engine, coordinator, display) = wire(config, Duration::from_secs(5));
    engine.pause(10);

    time::sleep(Duration::from_secs(5 * 60)).await;
    assert!(display.shown().is_empty());
    assert_eq!(coordinator.inspect().await.unwrap().active, None);

    engine.resume();
    time::sleep(Duration::from_secs(61)).await;
    assert_eq!(display.shown().len(), 1);
}
