use tokio::sync::mpsc;

use super::coordinator::Command;
use crate::error::DisplayError;
use crate::timer::EventKind;

/// Puts popups on screen. Implemented by the host application.
pub trait PopupDisplay: Send + Sync + 'static {
    /// Show the popup for `kind` and return without waiting for it.
    ///
    /// The popup must call [`CloseHandle::close`] once it is dismissed,
    /// completed, skipped or timed out. Returning an error counts as an
    /// immediate close.
    fn show(&self, kind: EventKind, on_close: CloseHandle) -> Result<(), DisplayError>;

    /// Take down a popup that was preempted by a more urgent one. Its
    /// close handle is void from now on.
    fn dismiss(&self, _kind: EventKind) {}
}

/// The scheduler side of the coordinator: suspend cadences while a popup is
/// visible and restart them once the queue has drained.
pub trait PopupGate: Send + Sync + 'static {
    fn pause_for_popup(&self);
    fn resume_after_popup(&self);
}

/// Continuation handed to [`PopupDisplay::show`].
///
/// Consumed by `close`, so a popup can report closing at most once.
#[derive(Debug)]
pub struct CloseHandle {
    kind: EventKind,
    ticket: u64,
    tx: mpsc::UnboundedSender<Command>,
}

impl CloseHandle {
    pub(crate) fn new(kind: EventKind, ticket: u64, tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { kind, ticket, tx }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Report the popup closed. Safe to call from any thread.
    pub fn close(self) {
        let _ = self.tx.send(Command::Closed {
            ticket: self.ticket,
        });
    }
}
