//! Shutdown fan-out to every listening port.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

/// One-shot shutdown broadcast.
///
/// Each server run holds a receiver. The first `trigger` notifies all of
/// them; later triggers are ignored so a repeated Ctrl+C does not resend.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber. Returns `false` if shutdown was already underway.
    pub fn trigger(&self) -> bool {
        if self.triggered.swap(true, Ordering::SeqCst) {
            tracing::debug!("Shutdown already in progress");
            return false;
        }
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::info!(listeners = notified, "Shutting down");
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Servers still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        assert!(shutdown.trigger());
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn second_trigger_is_ignored() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(rx.recv().await.is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn trigger_without_subscribers_still_marks_shutdown() {
        let shutdown = Shutdown::new();
        assert!(shutdown.trigger());
        assert!(shutdown.is_triggered());
    }
}
