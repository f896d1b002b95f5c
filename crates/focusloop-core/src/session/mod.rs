mod engine;
mod state;

pub use engine::{SessionEngine, Snapshot, COMPLETION_ALERT_ID};
pub use state::{Phase, SessionState, DEFAULT_PRESET_MIN};
