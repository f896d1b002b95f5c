//! Session timer engine.
//!
//! A wall-clock-based state machine. It owns no thread: ticking is
//! cooperative (the armed [`Ticker`] tells a driver when to call
//! [`SessionEngine::reconcile`]), and remaining time is always derived
//! from the absolute `target_end` deadline, never counted down. That is
//! what keeps the timer honest across suspension, backgrounding, and
//! process restarts.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> Idle
//! ```
//!
//! Natural completion is a transition back to Idle plus a history
//! append, not a resting state. Operations invoked in a state that does
//! not permit them are silent no-ops.

use chrono::Duration;
use serde::Serialize;

use crate::clock::{remaining_secs, Clock};
use crate::events::{EndReason, Event, EventNotifier};
use crate::hooks::Platform;
use crate::session::state::{Phase, SessionState};
use crate::storage::{HistoryRecord, SessionStore};
use crate::ticker::Ticker;

/// Identifier under which the one-shot completion alert is scheduled.
pub const COMPLETION_ALERT_ID: &str = "session-complete";

/// Read-only view of the engine for status surfaces.
///
/// `remaining_secs` is recomputed at snapshot time, so a stale persisted
/// value never leaks into a display.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub total_secs: u64,
    pub remaining_secs: u64,
    pub session_start: Option<chrono::DateTime<chrono::Utc>>,
    pub target_end: Option<chrono::DateTime<chrono::Utc>>,
    pub last_preset_min: Option<u32>,
    pub at: chrono::DateTime<chrono::Utc>,
}

/// The session timer state machine and sole owner of [`SessionState`].
///
/// Every mutating operation persists the state before any observer sees
/// the corresponding event, so external readers can always reconstruct
/// the timer from the store alone.
pub struct SessionEngine {
    state: SessionState,
    store: SessionStore,
    clock: Box<dyn Clock>,
    ticker: Box<dyn Ticker>,
    platform: Platform,
    notifier: EventNotifier,
}

impl SessionEngine {
    /// Build the engine, restoring persisted state (default Idle when
    /// no usable snapshot exists).
    pub fn new(
        store: SessionStore,
        clock: Box<dyn Clock>,
        ticker: Box<dyn Ticker>,
        platform: Platform,
    ) -> Self {
        let mut state = store.load_state().unwrap_or_default();
        let mut demoted = false;
        if state.running && state.target_end.is_none() {
            // Snapshot violated the deadline invariant; demote to
            // paused so no time is silently lost.
            tracing::warn!("restored running state without a deadline, demoting to paused");
            state.running = false;
            state.paused = true;
            demoted = true;
        }
        let mut engine = Self {
            state,
            store,
            clock,
            ticker,
            platform,
            notifier: EventNotifier::new(),
        };
        if demoted {
            // Overwrite the bad snapshot so external readers see the
            // demotion too, not just this process.
            engine.persist();
        }
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Current view with remaining time recomputed from the clock.
    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let remaining = match self.state.target_end {
            Some(target) if self.state.running => {
                remaining_secs(target, now).min(self.state.total_secs)
            }
            _ => self.state.remaining_secs,
        };
        Snapshot {
            phase: self.state.phase(),
            total_secs: self.state.total_secs,
            remaining_secs: remaining,
            session_start: self.state.session_start,
            target_end: self.state.target_end,
            last_preset_min: self.state.last_preset_min,
            at: now,
        }
    }

    /// Register an observer for session events. Observers run after the
    /// state they describe has been persisted.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&Event) + Send + 'static,
    {
        self.notifier.subscribe(observer);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Choose the session duration. Idle only; ignored mid-session.
    pub fn set_preset(&mut self, minutes: u32) {
        if self.state.phase() != Phase::Idle {
            return;
        }
        self.state = SessionState::idle(minutes);
        self.persist();
    }

    /// Begin a session. Idle only, and the configured duration must be
    /// non-zero.
    pub fn start(&mut self) -> Option<Event> {
        if self.state.phase() != Phase::Idle || self.state.remaining_secs == 0 {
            return None;
        }
        let now = self.clock.now();
        if self.state.session_start.is_none() {
            self.state.session_start = Some(now);
        }
        self.state.target_end = Some(now + Duration::seconds(self.state.remaining_secs as i64));
        self.state.running = true;
        self.state.paused = false;
        self.arm_schedules();
        self.persist();
        let event = Event::SessionStarted {
            duration_secs: self.state.total_secs,
            at: now,
        };
        self.notifier.publish(&event);
        Some(event)
    }

    /// Freeze the countdown. Running only.
    ///
    /// A session that is already overdue completes instead of pausing,
    /// so `completed == true` always means "ran to zero".
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        let now = self.clock.now();
        if let Some(target) = self.state.target_end {
            let remaining = remaining_secs(target, now);
            if remaining == 0 {
                return self.reconcile(false);
            }
            self.state.remaining_secs = remaining.min(self.state.total_secs);
        }
        self.state.target_end = None;
        self.state.running = false;
        self.state.paused = true;
        self.cancel_schedules();
        self.persist();
        self.notifier.publish(&Event::SessionWillEnd {
            reason: EndReason::Paused,
            at: now,
        });
        let event = Event::SessionPaused {
            remaining_secs: self.state.remaining_secs,
            at: now,
        };
        self.notifier.publish(&event);
        Some(event)
    }

    /// Continue a paused session from its frozen remaining time.
    pub fn resume(&mut self) -> Option<Event> {
        if !self.state.paused {
            return None;
        }
        let now = self.clock.now();
        self.state.target_end = Some(now + Duration::seconds(self.state.remaining_secs as i64));
        self.state.running = true;
        self.state.paused = false;
        self.arm_schedules();
        self.persist();
        let event = Event::SessionResumed {
            remaining_secs: self.state.remaining_secs,
            at: now,
        };
        self.notifier.publish(&event);
        Some(event)
    }

    /// End the session early. Running or Paused.
    ///
    /// With `record_history`, writes a history record whose
    /// `duration_secs` is the elapsed time and whose `completed` flag is
    /// true only if remaining had already reached zero.
    pub fn stop(&mut self, record_history: bool) -> Option<Event> {
        if self.state.phase() == Phase::Idle {
            return None;
        }
        let now = self.clock.now();
        if self.state.running {
            if let Some(target) = self.state.target_end {
                self.state.remaining_secs =
                    remaining_secs(target, now).min(self.state.total_secs);
            }
        }
        self.cancel_schedules();
        if record_history {
            self.append_history(now, self.state.remaining_secs == 0);
        }
        self.state.reset_to_idle();
        self.persist();
        let event = Event::SessionWillEnd {
            reason: EndReason::Stopped,
            at: now,
        };
        self.notifier.publish(&event);
        Some(event)
    }

    /// Recompute remaining time from the deadline.
    ///
    /// Idempotent and callable from any state; the `running` gate means
    /// redundant calls -- a UI tick racing a stale background wake, or a
    /// foreground activation right after restoration already completed
    /// the session -- cannot double-record anything. Returns the
    /// completion event when this call performed the natural-completion
    /// transition.
    pub fn reconcile(&mut self, trigger_haptics: bool) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        let target = self.state.target_end?;
        let now = self.clock.now();
        let remaining = remaining_secs(target, now).min(self.state.total_secs);
        self.state.remaining_secs = remaining;
        if remaining > 0 {
            self.persist();
            return None;
        }

        // Natural completion.
        self.cancel_schedules();
        let elapsed = self.state.elapsed_secs();
        self.append_history(now, true);
        self.state.reset_to_idle();
        self.persist();
        self.notifier.publish(&Event::SessionWillEnd {
            reason: EndReason::Completed,
            at: now,
        });
        let event = Event::SessionCompleted {
            elapsed_secs: elapsed,
            at: now,
        };
        self.notifier.publish(&event);
        if trigger_haptics {
            self.platform.haptics.completion_pulse();
        }
        Some(event)
    }

    // ── Lifecycle support ────────────────────────────────────────────

    /// Re-arm the foreground tick (foreground activation while running).
    pub fn restart_ticking(&mut self) {
        if self.state.running {
            self.ticker.arm();
        }
    }

    /// Drop the foreground tick (entering background).
    pub fn stop_ticking(&mut self) {
        self.ticker.cancel();
    }

    /// Arm the single background wake at the session deadline.
    pub fn arm_background_wake(&mut self) {
        if let Some(target) = self.state.target_end {
            if let Err(e) = self.platform.wake.schedule_at(target) {
                tracing::warn!(error = %e, "failed to arm background wake");
            }
        }
    }

    /// Cancel any pending background wake. A cancellation that silently
    /// fails is tolerated by the reconcile gate.
    pub fn cancel_background_wake(&mut self) {
        if let Err(e) = self.platform.wake.cancel() {
            tracing::warn!(error = %e, "failed to cancel background wake");
        }
    }

    /// Re-arm the one-shot completion alert from the current deadline.
    pub fn rearm_completion_alert(&mut self) {
        if !self.state.running {
            return;
        }
        let secs = match self.state.target_end {
            Some(target) => remaining_secs(target, self.clock.now()),
            None => return,
        };
        if let Err(e) = self.platform.alerts.schedule(secs, COMPLETION_ALERT_ID) {
            tracing::warn!(error = %e, "failed to re-arm completion alert");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Persist the snapshot, then push it to glanceable surfaces.
    /// A failed save is logged and otherwise ignored; the state machine
    /// keeps going and the next mutation retries the write.
    fn persist(&mut self) {
        if let Err(e) = self.store.save_state(&self.state) {
            tracing::warn!(error = %e, "failed to persist session state");
        }
        self.platform.surface.state_changed(&self.state);
    }

    fn arm_schedules(&mut self) {
        self.ticker.arm();
        if let Err(e) = self
            .platform
            .alerts
            .schedule(self.state.remaining_secs, COMPLETION_ALERT_ID)
        {
            tracing::warn!(error = %e, "failed to schedule completion alert");
        }
        self.arm_background_wake();
    }

    fn cancel_schedules(&mut self) {
        self.ticker.cancel();
        if let Err(e) = self.platform.alerts.cancel(COMPLETION_ALERT_ID) {
            tracing::warn!(error = %e, "failed to cancel completion alert");
        }
        self.cancel_background_wake();
    }

    fn append_history(&mut self, fallback_start: chrono::DateTime<chrono::Utc>, completed: bool) {
        let label = self.state.last_preset_min.map(|m| format!("{m} min"));
        let record = HistoryRecord::new(
            self.state.session_start.unwrap_or(fallback_start),
            self.state.elapsed_secs(),
            label,
            completed,
        );
        if let Err(e) = self.store.append_history(&record) {
            tracing::warn!(error = %e, "failed to append session history record");
        }
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ticker::NoopTicker;
    use chrono::{DateTime, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn engine(clock: &ManualClock) -> SessionEngine {
        SessionEngine::new(
            SessionStore::open_memory().unwrap(),
            Box::new(clock.clone()),
            Box::new(NoopTicker::default()),
            Platform::noop(),
        )
    }

    #[test]
    fn start_pause_resume() {
        let clock = ManualClock::new(t0());
        let mut engine = engine(&clock);
        assert_eq!(engine.phase(), Phase::Idle);

        assert!(engine.start().is_some());
        assert_eq!(engine.phase(), Phase::Running);
        assert!(engine.state().target_end.is_some());

        assert!(engine.pause().is_some());
        assert_eq!(engine.phase(), Phase::Paused);
        assert!(engine.state().target_end.is_none());

        assert!(engine.resume().is_some());
        assert_eq!(engine.phase(), Phase::Running);
    }

    #[test]
    fn second_start_is_noop_and_keeps_deadline() {
        let clock = ManualClock::new(t0());
        let mut engine = engine(&clock);
        engine.set_preset(25);
        engine.start();
        let deadline = engine.state().target_end;
        clock.advance(10);
        assert!(engine.start().is_none());
        assert_eq!(engine.state().target_end, deadline);
    }

    #[test]
    fn pause_while_idle_leaves_state_unchanged() {
        let clock = ManualClock::new(t0());
        let mut engine = engine(&clock);
        engine.set_preset(25);
        assert!(engine.pause().is_none());
        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.state().remaining_secs, 25 * 60);
    }

    #[test]
    fn resume_while_running_is_noop() {
        let clock = ManualClock::new(t0());
        let mut engine = engine(&clock);
        engine.start();
        assert!(engine.resume().is_none());
    }

    #[test]
    fn preset_is_ignored_mid_session() {
        let clock = ManualClock::new(t0());
        let mut engine = engine(&clock);
        engine.set_preset(25);
        engine.start();
        engine.set_preset(5);
        assert_eq!(engine.state().total_secs, 25 * 60);
        engine.pause();
        engine.set_preset(5);
        assert_eq!(engine.state().total_secs, 25 * 60);
    }

    #[test]
    fn zero_duration_session_cannot_start() {
        let clock = ManualClock::new(t0());
        let mut engine = engine(&clock);
        engine.set_preset(0);
        assert!(engine.start().is_none());
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn pause_of_an_overdue_session_completes_it() {
        let clock = ManualClock::new(t0());
        let mut engine = engine(&clock);
        engine.set_preset(5);
        engine.start();
        clock.advance(301);
        let event = engine.pause().expect("event");
        assert!(matches!(event, Event::SessionCompleted { .. }));
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn snapshot_recomputes_remaining_without_mutating() {
        let clock = ManualClock::new(t0());
        let mut engine = engine(&clock);
        engine.set_preset(25);
        engine.start();
        clock.advance(100);
        let snap = engine.snapshot();
        assert_eq!(snap.remaining_secs, 1400);
        // The stored value is only refreshed by reconcile.
        assert_eq!(engine.state().remaining_secs, 1500);
    }
}
