//! Popup coordinator.
//!
//! Reminders can fire from the engine's loop at any time, but only one popup
//! may be on screen. The coordinator is a single tokio task that owns the
//! active popup and the pending queue; everything else talks to it over a
//! channel, so enqueueing is a non-blocking send from any thread.
//!
//! ```text
//! Idle ──show──> Showing(k) ──close, queue empty──> Idle
//!                    │  ▲
//!                    │  └── close, queue non-empty (300 ms hop)
//!                    └───── preempted by a higher priority kind
//! ```

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Duration};
use tracing::{debug, info, warn};

use super::display::{CloseHandle, PopupDisplay, PopupGate};
use super::queue::PopupQueue;
use crate::error::DisplayError;
use crate::events::{Event, EventBus};
use crate::timer::{EventKind, FireHandler};

/// Pause between one popup closing and the next one opening.
pub const SHOW_NEXT_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub(crate) enum Command {
    Enqueue(EventKind),
    Closed { ticket: u64 },
    ShowNext(EventKind),
    Inspect(oneshot::Sender<CoordinatorSnapshot>),
}

/// What the coordinator is doing right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorSnapshot {
    pub active: Option<EventKind>,
    pub queue: Vec<EventKind>,
}

/// Handle to the coordinator task. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PopupCoordinator {
    tx: mpsc::UnboundedSender<Command>,
}

impl PopupCoordinator {
    /// Spawn the coordinator on the current tokio runtime.
    ///
    /// The task ends once every handle and every outstanding [`CloseHandle`]
    /// has been dropped.
    pub fn spawn<G, D>(gate: G, display: D, events: EventBus) -> Self
    where
        G: PopupGate,
        D: PopupDisplay,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Actor {
            gate,
            display,
            events,
            tx: tx.downgrade(),
            queue: PopupQueue::default(),
            active: None,
            next_ticket: 0,
        };
        tokio::spawn(actor.run(rx));
        Self { tx }
    }

    /// Ask for `kind` to be shown. Never blocks.
    pub fn enqueue(&self, kind: EventKind) {
        if self.tx.send(Command::Enqueue(kind)).is_err() {
            warn!(%kind, "popup coordinator has shut down; reminder dropped");
        }
    }

    /// The active popup and pending queue, after every command sent so far
    /// has been handled. `None` if the coordinator is gone.
    pub async fn inspect(&self) -> Option<CoordinatorSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Inspect(reply)).ok()?;
        rx.await.ok()
    }
}

impl FireHandler for PopupCoordinator {
    fn on_fire(&self, kind: EventKind) {
        self.enqueue(kind);
    }
}

#[derive(Debug, Clone, Copy)]
struct Active {
    kind: EventKind,
    ticket: u64,
}

struct Actor<G, D> {
    gate: G,
    display: D,
    events: EventBus,
    /// Weak so that the task can wind down when the handles are dropped.
    tx: mpsc::WeakUnboundedSender<Command>,
    queue: PopupQueue,
    active: Option<Active>,
    next_ticket: u64,
}

impl<G: PopupGate, D: PopupDisplay> Actor<G, D> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        debug!("popup coordinator started");
        while let Some(command) = rx.recv().await {
            let Command::Enqueue(kind) = command else {
                self.handle(command);
                continue;
            };
            // Fires that arrive together are applied most urgent first, so a
            // burst shows its top kind once instead of preempting in turn.
            let mut burst = vec![kind];
            let mut after = None;
            while let Ok(next) = rx.try_recv() {
                match next {
                    Command::Enqueue(kind) => burst.push(kind),
                    other => {
                        after = Some(other);
                        break;
                    }
                }
            }
            burst.sort_by_key(|kind| kind.priority());
            for kind in burst {
                self.enqueue(kind);
            }
            if let Some(command) = after {
                self.handle(command);
            }
        }
        debug!("popup coordinator stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Enqueue(kind) => self.enqueue(kind),
            Command::Closed { ticket } => self.closed(ticket),
            Command::ShowNext(kind) => self.show_next(kind),
            Command::Inspect(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            active: self.active.map(|active| active.kind),
            queue: self.queue.kinds(),
        }
    }

    fn is_pending(&self, kind: EventKind) -> bool {
        self.active.is_some_and(|active| active.kind == kind) || self.queue.contains(kind)
    }

    fn enqueue(&mut self, kind: EventKind) {
        if self.is_pending(kind) {
            debug!(%kind, "popup already active or queued");
            return;
        }
        match self.active {
            None => self.show(kind),
            Some(current) if kind.outranks(current.kind) => self.preempt(current, kind),
            Some(_) => {
                self.queue.insert(kind);
                let queue_len = self.queue.len();
                info!(%kind, queue_len, "popup queued");
                self.events.publish(Event::PopupQueued {
                    kind,
                    queue_len,
                    at: Utc::now(),
                });
            }
        }
    }

    fn preempt(&mut self, current: Active, kind: EventKind) {
        info!(preempted = %current.kind, by = %kind, "popup preempted");
        self.active = None;
        self.display.dismiss(current.kind);
        self.queue.push_front(current.kind);
        self.events.publish(Event::PopupPreempted {
            preempted: current.kind,
            by: kind,
            at: Utc::now(),
        });
        self.show(kind);
    }

    fn show(&mut self, kind: EventKind) {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.active = Some(Active { kind, ticket });
        self.gate.pause_for_popup();

        let shown = match self.tx.upgrade() {
            Some(tx) => self.display.show(kind, CloseHandle::new(kind, ticket, tx)),
            None => Err(DisplayError::new(kind, "popup coordinator is shutting down")),
        };
        match shown {
            Ok(()) => {
                info!(%kind, "popup shown");
                self.events.publish(Event::PopupShown {
                    kind,
                    at: Utc::now(),
                });
            }
            Err(err) => {
                warn!(%kind, error = %err, "popup could not be displayed");
                self.events.publish(Event::PopupFailed {
                    kind,
                    message: err.message,
                    at: Utc::now(),
                });
                self.closed(ticket);
            }
        }
    }

    fn closed(&mut self, ticket: u64) {
        let Some(active) = self.active.filter(|active| active.ticket == ticket) else {
            debug!(ticket, "close from a popup that is no longer active");
            return;
        };
        self.active = None;
        info!(kind = %active.kind, "popup closed");
        self.events.publish(Event::PopupClosed {
            kind: active.kind,
            at: Utc::now(),
        });

        match self.queue.pop_front() {
            Some(next) => self.schedule_next(next),
            None => self.gate.resume_after_popup(),
        }
    }

    fn schedule_next(&mut self, kind: EventKind) {
        let Some(tx) = self.tx.upgrade() else {
            debug!(%kind, "coordinator shutting down; dropping pending popups");
            self.queue = PopupQueue::default();
            self.gate.resume_after_popup();
            return;
        };
        tokio::spawn(async move {
            time::sleep(SHOW_NEXT_DELAY).await;
            let _ = tx.send(Command::ShowNext(kind));
        });
    }

    fn show_next(&mut self, kind: EventKind) {
        if self.active.is_some() {
            // Something was enqueued during the hop and got the screen first.
            if !self.is_pending(kind) {
                self.queue.push_front(kind);
            }
            debug!(%kind, "popup became active before the next one; requeued");
            return;
        }
        self.show(kind);
    }
}
