//! Seams for platform collaborators.
//!
//! The engine drives alerts, background wakes, glanceable surfaces and
//! haptics through these traits; the concrete mechanisms (notification
//! center, OS background task API, widget push) live outside the core
//! and are swapped per target platform. All methods are best-effort:
//! a failure here degrades proactivity, never correctness, because the
//! engine always recomputes from absolute timestamps on reconcile.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::session::SessionState;

/// A platform hook could not be armed or cancelled.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct HookError(pub String);

/// One-shot local alert, e.g. the "session complete" notification.
pub trait AlertScheduler: Send {
    /// Schedule an alert to fire in `secs` seconds under `id`,
    /// replacing any pending alert with the same id.
    fn schedule(&mut self, secs: u64, id: &str) -> Result<(), HookError>;

    /// Cancel the pending alert with `id`, if any. Cancelling may
    /// silently fail to take effect; the engine's reconcile gate
    /// tolerates a stale firing.
    fn cancel(&mut self, id: &str) -> Result<(), HookError>;
}

/// A single OS-scheduled background wake-up.
pub trait WakeScheduler: Send {
    /// Request a wake at (or slightly before) `at`, replacing any
    /// previously requested wake.
    fn schedule_at(&mut self, at: DateTime<Utc>) -> Result<(), HookError>;

    /// Drop the pending wake request, if any.
    fn cancel(&mut self) -> Result<(), HookError>;
}

/// Push-style refresh for read-only external surfaces (widgets,
/// lock-screen status). Called after every persisted state change;
/// surfaces re-read the stored snapshot and recompute remaining time
/// themselves via the clock model.
pub trait SurfaceNotifier: Send {
    fn state_changed(&mut self, state: &SessionState);
}

/// One-shot physical feedback on natural completion.
pub trait HapticFeedback: Send {
    fn completion_pulse(&mut self);
}

/// The collaborator bundle handed to the engine at construction.
///
/// Explicit injection, no global container: whoever builds the engine
/// decides which platform implementations it talks to.
pub struct Platform {
    pub alerts: Box<dyn AlertScheduler>,
    pub wake: Box<dyn WakeScheduler>,
    pub surface: Box<dyn SurfaceNotifier>,
    pub haptics: Box<dyn HapticFeedback>,
}

impl Platform {
    /// A platform that does nothing, for headless use and tests.
    pub fn noop() -> Self {
        Self {
            alerts: Box::new(NoopAlerts),
            wake: Box::new(NoopWake),
            surface: Box::new(NoopSurface),
            haptics: Box::new(NoopHaptics),
        }
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Platform { .. }")
    }
}

pub struct NoopAlerts;

impl AlertScheduler for NoopAlerts {
    fn schedule(&mut self, _secs: u64, _id: &str) -> Result<(), HookError> {
        Ok(())
    }

    fn cancel(&mut self, _id: &str) -> Result<(), HookError> {
        Ok(())
    }
}

pub struct NoopWake;

impl WakeScheduler for NoopWake {
    fn schedule_at(&mut self, _at: DateTime<Utc>) -> Result<(), HookError> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), HookError> {
        Ok(())
    }
}

pub struct NoopSurface;

impl SurfaceNotifier for NoopSurface {
    fn state_changed(&mut self, _state: &SessionState) {}
}

pub struct NoopHaptics;

impl HapticFeedback for NoopHaptics {
    fn completion_pulse(&mut self) {}
}
