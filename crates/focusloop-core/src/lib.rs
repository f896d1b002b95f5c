//! # Focusloop Core Library
//!
//! Core business logic for the Focusloop focus-session timer. All
//! operations are available to any shell -- CLI, voice command surface,
//! or a GUI layer -- through the same engine API.
//!
//! ## Architecture
//!
//! - **Session Engine**: a wall-clock state machine; remaining time is
//!   derived from an absolute deadline and reconciled on every tick,
//!   wake, or restart rather than counted down
//! - **Storage**: SQLite session snapshot + append-only history, and
//!   TOML-based configuration
//! - **Lifecycle**: coordinator mapping foreground/background/wake
//!   signals onto engine reconciliation
//! - **Hooks**: trait seams for alerts, background wakes, glanceable
//!   surfaces and haptics, injected explicitly at construction
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: the timer state machine and sole state owner
//! - [`SessionStore`]: snapshot and history persistence
//! - [`LifecycleCoordinator`]: lifecycle-signal dispatch
//! - [`EventNotifier`]: in-process event fan-out to observers

pub mod clock;
pub mod error;
pub mod events;
pub mod hooks;
pub mod lifecycle;
pub mod session;
pub mod storage;
pub mod ticker;

pub use clock::{remaining_secs, Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, Result, StorageError};
pub use events::{EndReason, Event, EventNotifier};
pub use hooks::{
    AlertScheduler, HapticFeedback, HookError, Platform, SurfaceNotifier, WakeScheduler,
};
pub use lifecycle::{LifecycleCoordinator, LifecycleSignal};
pub use session::{Phase, SessionEngine, SessionState, Snapshot, COMPLETION_ALERT_ID};
pub use storage::{Config, HistoryRecord, SessionStore};
pub use ticker::{IntervalTicker, NoopTicker, Ticker};
