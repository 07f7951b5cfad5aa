//! One popup at a time: queueing, priority and preemption.

mod coordinator;
mod display;
mod queue;

pub use coordinator::{CoordinatorSnapshot, PopupCoordinator, SHOW_NEXT_DELAY};
pub use display::{CloseHandle, PopupDisplay, PopupGate};
