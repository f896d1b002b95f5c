//! Session lifecycle events and their in-process delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a running or paused session stopped counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    Completed,
    Paused,
    Stopped,
}

/// Every session state change produces an Event.
///
/// Observers (automation hooks, history views, external surfaces)
/// subscribe through [`EventNotifier`]; by the time an event is
/// delivered the persisted snapshot is already durable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The session ran to zero remaining time.
    SessionCompleted {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// The countdown is about to stop for the given reason. Emitted in
    /// addition to the specific event so automation collaborators that
    /// only care about "the end" have a single signal to watch.
    SessionWillEnd {
        reason: EndReason,
        at: DateTime<Utc>,
    },
}

type Observer = Box<dyn Fn(&Event) + Send>;

/// Best-effort, in-process event fan-out.
///
/// Observers never get a reference to the engine; they see events only
/// after the corresponding state has been persisted.
#[derive(Default)]
pub struct EventNotifier {
    observers: Vec<Observer>,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: Fn(&Event) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn publish(&self, event: &Event) {
        for observer in &self.observers {
            observer(event);
        }
    }
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn publish_reaches_every_observer_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = EventNotifier::new();
        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            notifier.subscribe(move |event| {
                if let Event::SessionStarted { duration_secs, .. } = event {
                    seen.lock().unwrap().push((tag, *duration_secs));
                }
            });
        }
        notifier.publish(&Event::SessionStarted {
            duration_secs: 1500,
            at: Utc::now(),
        });
        assert_eq!(*seen.lock().unwrap(), vec![("a", 1500), ("b", 1500)]);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(Event::SessionWillEnd {
            reason: EndReason::Stopped,
            at: Utc::now(),
        })
        .unwrap();
        assert_eq!(json["type"], "SessionWillEnd");
        assert_eq!(json["reason"], "stopped");
    }
}
