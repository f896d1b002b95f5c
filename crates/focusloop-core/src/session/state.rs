//! The authoritative session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default preset when no prior state or config exists.
pub const DEFAULT_PRESET_MIN: u32 = 25;

/// Derived view of the mutually exclusive running/paused flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

/// The single source of truth for the current session.
///
/// Owned exclusively by the engine -- every other consumer (widgets,
/// CLI status, automation observers) reads a persisted or broadcast
/// copy. While running, `remaining_secs` is a display value recomputed
/// from `target_end`; the deadline is the ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Configured duration of the current/most recent session.
    pub total_secs: u64,
    /// Derived remaining time, `0 ..= total_secs`.
    pub remaining_secs: u64,
    pub running: bool,
    pub paused: bool,
    /// Set on the first transition out of Idle; cleared on stop/completion.
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,
    /// Present if and only if `running`.
    #[serde(default)]
    pub target_end: Option<DateTime<Utc>>,
    /// Last duration the user chose, to pre-fill future sessions.
    #[serde(default)]
    pub last_preset_min: Option<u32>,
}

impl SessionState {
    /// Idle state for the given preset.
    pub fn idle(preset_min: u32) -> Self {
        let total = u64::from(preset_min) * 60;
        Self {
            total_secs: total,
            remaining_secs: total,
            running: false,
            paused: false,
            session_start: None,
            target_end: None,
            last_preset_min: Some(preset_min),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.running {
            Phase::Running
        } else if self.paused {
            Phase::Paused
        } else {
            Phase::Idle
        }
    }

    /// Seconds spent in the current session so far.
    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs.saturating_sub(self.remaining_secs)
    }

    /// Return to idle, remaining reset to the full duration.
    pub(crate) fn reset_to_idle(&mut self) {
        self.running = false;
        self.paused = false;
        self.remaining_secs = self.total_secs;
        self.session_start = None;
        self.target_end = None;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle(DEFAULT_PRESET_MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle_with_default_preset() {
        let state = SessionState::default();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.total_secs, 25 * 60);
        assert_eq!(state.remaining_secs, 25 * 60);
        assert!(state.target_end.is_none());
    }

    #[test]
    fn reset_clears_timestamps_and_restores_remaining() {
        let mut state = SessionState::idle(10);
        state.running = true;
        state.remaining_secs = 1;
        state.session_start = Some(Utc::now());
        state.target_end = Some(Utc::now());
        state.reset_to_idle();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.remaining_secs, 600);
        assert!(state.session_start.is_none());
        assert!(state.target_end.is_none());
    }

    #[test]
    fn snapshot_survives_json_round_trip_with_missing_optionals() {
        // Old snapshots may predate the optional fields.
        let json = r#"{"total_secs":600,"remaining_secs":300,"running":false,"paused":true}"#;
        let state: SessionState = serde_json::from_str(json).unwrap();
        assert_eq!(state.phase(), Phase::Paused);
        assert!(state.target_end.is_none());
        assert!(state.last_preset_min.is_none());
    }
}
