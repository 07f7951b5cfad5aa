use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::timer::{EventKind, SuppressReason};

/// Every decision the scheduler or the popup coordinator makes produces an Event.
/// Hosts subscribe to them for status displays and logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A cadence came due and its handler was invoked.
    ReminderFired {
        kind: EventKind,
        /// Eye exercise folded into this big break.
        merged_eyes: bool,
        at: DateTime<Utc>,
    },
    /// A cadence came due but a protection zone held it back.
    ReminderSuppressed {
        kind: EventKind,
        reason: SuppressReason,
        at: DateTime<Utc>,
    },
    SchedulerPaused {
        minutes: u32,
        at: DateTime<Utc>,
    },
    SchedulerResumed {
        at: DateTime<Utc>,
    },
    PopupShown {
        kind: EventKind,
        at: DateTime<Utc>,
    },
    PopupQueued {
        kind: EventKind,
        queue_len: usize,
        at: DateTime<Utc>,
    },
    /// `preempted` went back to the queue so `by` could show immediately.
    PopupPreempted {
        preempted: EventKind,
        by: EventKind,
        at: DateTime<Utc>,
    },
    PopupClosed {
        kind: EventKind,
        at: DateTime<Utc>,
    },
    PopupFailed {
        kind: EventKind,
        message: String,
        at: DateTime<Utc>,
    },
}

const EVENT_BUS_CAPACITY: usize = 64;

/// Broadcast channel shared by the engine and the coordinator.
///
/// Publishing never blocks; with no subscribers events are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
