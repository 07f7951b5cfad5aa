//! # Breaktime Core Library
//!
//! This library provides the scheduling core of Breaktime, a desktop reminder
//! that nudges the user to take breaks, drink water and exercise their eyes.
//! Rendering, persistence of break history and the tray icon live in the host
//! application; this crate only decides *when* something should be shown and
//! makes sure at most one popup is on screen at a time.
//!
//! ## Architecture
//!
//! - **Timer Engine**: four recurring cadences evaluated once per second on a
//!   monotonic clock, with protection zones that suppress or merge reminders
//!   around an imminent break
//! - **Popup Coordinator**: an actor task that queues fire requests by
//!   priority, deduplicates them, preempts lower-priority popups and pauses
//!   the engine while something is visible
//! - **Storage**: TOML-based configuration with work-method presets
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Recurring reminder scheduler
//! - [`PopupCoordinator`]: Single-flight popup queue
//! - [`Config`]: Application configuration management
//! - [`EventBus`]: Broadcast stream of scheduler and popup events

pub mod error;
pub mod events;
pub mod popup;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DisplayError, ValidationError};
pub use events::{Event, EventBus};
pub use popup::{CloseHandle, CoordinatorSnapshot, PopupCoordinator, PopupDisplay, PopupGate};
pub use storage::{BreakMode, Config, WorkMethodPreset};
pub use timer::{EngineSnapshot, EventKind, FireHandler, SuppressReason, TickOutcome, TimerEngine};
