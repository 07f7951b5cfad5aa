mod engine;
mod kind;
mod state;
mod work_hours;

pub use engine::{FireHandler, TimerEngine, DEFAULT_PAUSE_MINUTES};
pub use kind::EventKind;
pub use state::{EngineSnapshot, SuppressReason, TickOutcome, PROTECTION_ZONE_SECS};
pub use work_hours::within_work_hours;
