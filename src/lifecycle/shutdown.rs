//! Cancellation for an in-progress boot.

use tokio::sync::watch;

/// Coordinator for aborting the boot.
///
/// Holds a watch channel so that a subscriber created after the trigger still
/// observes it.
pub struct Shutdown {
    tx: watch::Sender<Option<&'static str>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal. The first reason wins.
    pub fn trigger(&self, reason: &'static str) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
        tracing::info!(reason, "Boot cancellation requested");
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<&'static str>>,
}

impl ShutdownSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(None);
        Self { rx }
    }

    /// Resolve with the reason once shutdown is triggered.
    ///
    /// If the coordinator is dropped without triggering, this never resolves.
    pub async fn cancelled(&mut self) -> &'static str {
        loop {
            if let Some(reason) = *self.rx.borrow_and_update() {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }

    /// Reason the boot was cancelled, if it was (non-blocking).
    pub fn reason(&self) -> Option<&'static str> {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger("SIGTERM");

        let mut signal = shutdown.subscribe();
        assert_eq!(signal.reason(), Some("SIGTERM"));
        assert_eq!(signal.cancelled().await, "SIGTERM");
    }

    #[tokio::test]
    async fn first_reason_wins() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        shutdown.trigger("SIGINT");
        shutdown.trigger("SIGTERM");
        assert_eq!(signal.cancelled().await, "SIGINT");
        assert_eq!(signal.reason(), Some("SIGINT"));
    }

    #[tokio::test(start_paused = true)]
    async fn never_signal_stays_pending() {
        let mut signal = ShutdownSignal::never();
        let result = tokio::time::timeout(Duration::from_secs(60), signal.cancelled()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_coordinator_does_not_cancel() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        drop(shutdown);
        let result = tokio::time::timeout(Duration::from_secs(60), signal.cancelled()).await;
        assert!(result.is_err());
    }
}
