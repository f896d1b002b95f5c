//! Foreground tick abstraction.
//!
//! The engine does not own a thread or a run loop; it arms a [`Ticker`]
//! while running and cancels it otherwise. The driver that receives the
//! ticks (a CLI loop, a GUI shell) calls `reconcile` on each one.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A repeating scheduled callback, independent of any UI framework.
pub trait Ticker: Send {
    /// Begin ticking. Arming an already armed ticker is a no-op.
    fn arm(&mut self);

    /// Stop ticking. Cancelling an idle ticker is a no-op.
    fn cancel(&mut self);

    fn is_armed(&self) -> bool;
}

/// Ticker for contexts with no runtime (one-shot CLI commands, tests).
#[derive(Debug, Default)]
pub struct NoopTicker {
    armed: bool,
}

impl Ticker for NoopTicker {
    fn arm(&mut self) {
        self.armed = true;
    }

    fn cancel(&mut self) {
        self.armed = false;
    }

    fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Tokio-backed ticker sending `()` on a channel at a fixed interval.
///
/// `arm` must be called from within a tokio runtime.
pub struct IntervalTicker {
    interval: Duration,
    tx: mpsc::UnboundedSender<()>,
    task: Option<JoinHandle<()>>,
}

impl IntervalTicker {
    /// Create the ticker and the receiving end the driver loops on.
    pub fn new(interval: Duration) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                interval,
                tx,
                task: None,
            },
            rx,
        )
    }
}

impl Ticker for IntervalTicker {
    fn arm(&mut self) {
        if self.task.is_some() {
            return;
        }
        let tx = self.tx.clone();
        let interval = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            // The first tick of tokio's interval fires immediately;
            // skip it so ticks land at interval boundaries.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_armed(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn interval_ticker_delivers_ticks() {
        let (mut ticker, mut rx) = IntervalTicker::new(Duration::from_millis(5));
        ticker.arm();
        assert!(ticker.is_armed());
        rx.recv().await.expect("tick");
        rx.recv().await.expect("tick");
        ticker.cancel();
        assert!(!ticker.is_armed());
    }

    #[tokio::test]
    async fn double_arm_is_noop() {
        let (mut ticker, _rx) = IntervalTicker::new(Duration::from_millis(5));
        ticker.arm();
        ticker.arm();
        assert!(ticker.is_armed());
    }
}
