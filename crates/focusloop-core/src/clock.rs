//! Wall-clock model.
//!
//! Remaining time is always derived from an absolute deadline, never from
//! an accumulated countdown. Every reconciliation path (foreground tick,
//! background wake, cold-start restore) goes through [`remaining_secs`]
//! so that one piece of arithmetic governs all of them.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Seconds left until `target`, as seen at `now`.
///
/// Rounds up to whole seconds and clamps at zero -- a deadline in the
/// past always reads as 0, no matter how long the process was suspended.
pub fn remaining_secs(target: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let ms = (target - now).num_milliseconds();
    if ms <= 0 {
        0
    } else {
        (ms as u64).div_ceil(1000)
    }
}

/// Source of the current time.
///
/// The engine and the lifecycle coordinator never call `Utc::now()`
/// directly; they read through this trait so tests and simulations can
/// substitute a controlled clock.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A shared, manually advanced clock for tests and simulations.
///
/// Clones observe the same instant; advancing any handle advances all.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(start)))
    }

    /// Move the clock forward by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        let mut now = self.0.lock().unwrap();
        *now += Duration::seconds(secs);
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: i64) {
        let mut now = self.0.lock().unwrap();
        *now += Duration::milliseconds(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn exact_deadline_reads_zero() {
        let now = t0();
        assert_eq!(remaining_secs(now, now), 0);
    }

    #[test]
    fn past_deadline_clamps_to_zero() {
        let now = t0();
        assert_eq!(remaining_secs(now - Duration::seconds(3600), now), 0);
    }

    #[test]
    fn partial_seconds_round_up() {
        let now = t0();
        let target = now + Duration::milliseconds(1500);
        assert_eq!(remaining_secs(target, now), 2);
        let target = now + Duration::milliseconds(1);
        assert_eq!(remaining_secs(target, now), 1);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(t0());
        let other = clock.clone();
        clock.advance(90);
        assert_eq!(other.now(), t0() + Duration::seconds(90));
    }

    proptest! {
        #[test]
        fn never_exceeds_ceiling_and_never_negative(offset_ms in -86_400_000i64..86_400_000i64) {
            let now = t0();
            let target = now + Duration::milliseconds(offset_ms);
            let secs = remaining_secs(target, now);
            if offset_ms <= 0 {
                prop_assert_eq!(secs, 0);
            } else {
                // ceil(offset / 1000)
                prop_assert_eq!(secs as i64, (offset_ms + 999) / 1000);
            }
        }
    }
}
