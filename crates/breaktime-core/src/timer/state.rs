//! Cadence bookkeeping and the per-tick decision procedure.
//!
//! Everything here takes `now` explicitly so the rules can be exercised
//! without a running clock. [`super::TimerEngine`] owns one `EngineState`
//! behind a mutex and feeds it `Instant::now()`.

use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

use super::kind::EventKind;
use super::work_hours::within_work_hours;
use crate::storage::Config;

/// Window before a break during which competing reminders are held back.
pub const PROTECTION_ZONE_SECS: f64 = 5.0 * 60.0;

/// A previous session older than this is ignored at startup.
const LONG_ABSENCE: Duration = Duration::from_secs(30 * 60);

/// Overdue breaks carried over from a previous session fire this late at most.
const STARTUP_GRACE_SECS: f64 = 300.0;

/// Why a due reminder did not fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    SmallBreakImminent,
    BigBreakImminent,
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A timed pause ran out; all cadences restarted and nothing fired.
    PauseExpired,
    Paused,
    PopupActive,
    OutsideWorkHours,
    Evaluated {
        fired: Vec<EventKind>,
        /// Reminders held back this tick for the first time since their
        /// clock last restarted.
        suppressed: Vec<(EventKind, SuppressReason)>,
        /// The big break that fired absorbed the eye exercise.
        merged_eyes: bool,
    },
}

impl TickOutcome {
    pub fn fired(&self) -> &[EventKind] {
        match self {
            TickOutcome::Evaluated { fired, .. } => fired,
            _ => &[],
        }
    }
}

/// Serializable view of the scheduler for status displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub running: bool,
    pub paused: bool,
    pub popup_paused: bool,
    pub outside_work_hours: bool,
    /// Seconds until each cadence is due; negative when overdue.
    pub time_to_big_break: f64,
    pub time_to_small_break: f64,
    pub time_to_eye_exercise: f64,
    pub time_to_water: f64,
    /// Merge flag not yet consumed by the display layer.
    pub include_eyes_in_big_break: bool,
}

#[derive(Debug)]
pub(crate) struct EngineState {
    last_fired: [Instant; 4],
    paused: bool,
    pause_until: Option<Instant>,
    pause_started: Option<Instant>,
    popup_paused: bool,
    include_eyes_in_big_break: bool,
    suppression_reported: [bool; 4],
}

impl EngineState {
    /// Initial clocks, continuing a break cycle from a previous session when
    /// it ended less than half an hour ago.
    pub fn seeded(now: Instant, since_last_break: Option<Duration>, config: &Config) -> Self {
        let mut last_fired = [now; 4];

        if let Some(elapsed) = since_last_break.filter(|e| *e <= LONG_ABSENCE) {
            let elapsed = elapsed.as_secs_f64();
            for kind in [EventKind::BigBreak, EventKind::SmallBreak] {
                let interval = config.interval_secs(kind);
                let mut remaining = interval - elapsed;
                if remaining < 0.0 {
                    remaining = interval.min(STARTUP_GRACE_SECS);
                }
                last_fired[kind.index()] = rewind(now, interval - remaining);
            }
        }

        Self {
            last_fired,
            paused: false,
            pause_until: None,
            pause_started: None,
            popup_paused: false,
            include_eyes_in_big_break: false,
            suppression_reported: [false; 4],
        }
    }

    pub fn last_fired(&self, kind: EventKind) -> Instant {
        self.last_fired[kind.index()]
    }

    pub fn time_to_next(&self, kind: EventKind, now: Instant, config: &Config) -> f64 {
        let elapsed = now
            .saturating_duration_since(self.last_fired(kind))
            .as_secs_f64();
        config.interval_secs(kind) - elapsed
    }

    pub fn reset(&mut self, kind: EventKind, now: Instant) {
        self.last_fired[kind.index()] = now;
        self.suppression_reported[kind.index()] = false;
    }

    pub fn reset_all(&mut self, now: Instant) {
        for kind in EventKind::ALL {
            self.reset(kind, now);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_popup_paused(&self) -> bool {
        self.popup_paused
    }

    pub fn pause(&mut self, now: Instant, minutes: u32) {
        self.paused = true;
        self.pause_started = Some(now);
        self.pause_until = Some(now + Duration::from_secs(u64::from(minutes) * 60));
    }

    pub fn resume(&mut self, now: Instant) {
        self.paused = false;
        self.pause_until = None;
        self.pause_started = None;
        self.reset_all(now);
    }

    pub fn pause_for_popup(&mut self) {
        self.popup_paused = true;
    }

    /// A closed popup counts as having attended to every cadence.
    pub fn resume_after_popup(&mut self, now: Instant) {
        self.popup_paused = false;
        self.reset_all(now);
    }

    /// Read-clears the merge flag.
    pub fn take_include_eyes(&mut self) -> bool {
        std::mem::take(&mut self.include_eyes_in_big_break)
    }

    /// One scheduling decision. `clock` is the local time as `HH:MM`.
    pub fn tick(&mut self, now: Instant, clock: &str, config: &Config) -> TickOutcome {
        if self.paused {
            if self.pause_until.is_some_and(|until| now >= until) {
                self.resume(now);
                return TickOutcome::PauseExpired;
            }
            return TickOutcome::Paused;
        }
        if self.popup_paused {
            return TickOutcome::PopupActive;
        }
        if !within_work_hours(config, clock) {
            return TickOutcome::OutsideWorkHours;
        }

        let to_big = self.time_to_next(EventKind::BigBreak, now, config);
        let to_small = self.time_to_next(EventKind::SmallBreak, now, config);
        let to_eye = self.time_to_next(EventKind::EyeExercise, now, config);
        let to_water = self.time_to_next(EventKind::WaterReminder, now, config);

        let mut fired = Vec::new();
        let mut suppressed = Vec::new();

        if to_big <= 0.0 {
            self.reset(EventKind::BigBreak, now);
            self.reset(EventKind::SmallBreak, now);
            let merged_eyes = to_eye <= PROTECTION_ZONE_SECS;
            if merged_eyes {
                self.include_eyes_in_big_break = true;
                self.reset(EventKind::EyeExercise, now);
            }
            fired.push(EventKind::BigBreak);
            return TickOutcome::Evaluated {
                fired,
                suppressed,
                merged_eyes,
            };
        }

        if to_small <= 0.0 {
            self.reset(EventKind::SmallBreak, now);
            if to_big <= PROTECTION_ZONE_SECS {
                suppressed.push((EventKind::SmallBreak, SuppressReason::BigBreakImminent));
            } else {
                fired.push(EventKind::SmallBreak);
            }
            return TickOutcome::Evaluated {
                fired,
                suppressed,
                merged_eyes: false,
            };
        }

        // Both breaks are still ahead (> 0) from here on.
        let zone = if to_small <= PROTECTION_ZONE_SECS {
            Some(SuppressReason::SmallBreakImminent)
        } else if to_big <= PROTECTION_ZONE_SECS {
            Some(SuppressReason::BigBreakImminent)
        } else {
            None
        };

        for (kind, due) in [
            (EventKind::EyeExercise, to_eye <= 0.0),
            (EventKind::WaterReminder, to_water <= 0.0),
        ] {
            if !due {
                continue;
            }
            match zone {
                Some(reason) => {
                    if !self.suppression_reported[kind.index()] {
                        self.suppression_reported[kind.index()] = true;
                        suppressed.push((kind, reason));
                    }
                }
                None => {
                    self.reset(kind, now);
                    fired.push(kind);
                }
            }
        }

        TickOutcome::Evaluated {
            fired,
            suppressed,
            merged_eyes: false,
        }
    }

    pub fn snapshot(&self, now: Instant, clock: &str, config: &Config) -> EngineSnapshot {
        // Countdowns stand still while a timed pause is in effect.
        let at = self.pause_started.unwrap_or(now);
        EngineSnapshot {
            running: false,
            paused: self.paused,
            popup_paused: self.popup_paused,
            outside_work_hours: !within_work_hours(config, clock),
            time_to_big_break: self.time_to_next(EventKind::BigBreak, at, config),
            time_to_small_break: self.time_to_next(EventKind::SmallBreak, at, config),
            time_to_eye_exercise: self.time_to_next(EventKind::EyeExercise, at, config),
            time_to_water: self.time_to_next(EventKind::WaterReminder, at, config),
            include_eyes_in_big_break: self.include_eyes_in_big_break,
        }
    }
}

fn rewind(now: Instant, secs: f64) -> Instant {
    now.checked_sub(Duration::from_secs_f64(secs.max(0.0)))
        .unwrap_or(now)
}
