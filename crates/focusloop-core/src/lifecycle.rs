//! Lifecycle coordinator.
//!
//! Translates process-lifecycle signals into engine calls. The engine
//! never hears about the OS directly; whatever shell hosts it (mobile
//! app delegate, desktop tray, CLI loop) forwards a [`LifecycleSignal`]
//! here.

use crate::session::SessionEngine;

/// Process-lifecycle transitions the host forwards to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// The app regained foreground execution (launch or reactivation).
    BecameActive,
    /// The app is leaving the foreground.
    EnteredBackground,
    /// An OS-scheduled background wake-up fired. Work here must stay
    /// within the OS execution budget; one reconcile and one re-arm.
    BackgroundWake,
}

/// Stateless dispatcher from lifecycle signals to engine operations.
#[derive(Debug, Default)]
pub struct LifecycleCoordinator;

impl LifecycleCoordinator {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, engine: &mut SessionEngine, signal: LifecycleSignal) {
        match signal {
            LifecycleSignal::BecameActive => {
                // Covers any time elapsed while suspended. Haptics stay
                // off: a completion discovered on activation is stale.
                engine.reconcile(false);
                if engine.state().running {
                    // Tick, wake and alert were torn down (or may have
                    // fired) while backgrounded.
                    engine.restart_ticking();
                    engine.arm_background_wake();
                    engine.rearm_completion_alert();
                }
            }
            LifecycleSignal::EnteredBackground => {
                // Snapshot the freshest value, stop the now-useless
                // foreground tick, and leave a single wake armed at the
                // deadline so state is fresh even if the app never
                // reopens before completion.
                engine.reconcile(false);
                engine.stop_ticking();
                if engine.state().running {
                    engine.arm_background_wake();
                } else {
                    engine.cancel_background_wake();
                }
            }
            LifecycleSignal::BackgroundWake => {
                engine.reconcile(false);
                if engine.state().running {
                    engine.arm_background_wake();
                } else {
                    engine.cancel_background_wake();
                }
            }
        }
    }
}
