//! CollectContext - cancellation view for a sweep
//!
//! A sweep checks its context between callbacks and aborts once cancelled.
//! Backed by a tokio watch channel so the provider's stop path can cancel an
//! in-flight sweep and the scheduler loop with one signal.

use tokio::sync::watch;

/// Cancellation side of a collect context
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel every context derived from this handle
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Derive another context observing this handle
    pub fn context(&self) -> CollectContext {
        CollectContext {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side handed to sweeps and callbacks
#[derive(Debug, Clone)]
pub struct CollectContext {
    rx: watch::Receiver<bool>,
}

impl CollectContext {
    /// Wrap an existing watch receiver (true = cancelled)
    pub fn from_watch(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A context that can never be cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        // Sender dropped; the receiver keeps reporting the last value.
        Self { rx }
    }

    /// Whether the sweep should stop
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until cancelled
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow() {
            // A closed channel counts as cancellation.
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Create a connected cancel handle and context
pub fn cancel_pair() -> (CancelHandle, CollectContext) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CollectContext { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_pair() {
        let (handle, cx) = cancel_pair();
        assert!(!cx.is_cancelled());
        handle.cancel();
        assert!(cx.is_cancelled());
        assert!(handle.context().is_cancelled());
    }

    #[test]
    fn test_never_context() {
        let cx = CollectContext::never();
        assert!(!cx.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiters() {
        let (handle, mut cx) = cancel_pair();
        let waiter = tokio::spawn(async move {
            cx.cancelled().await;
        });
        handle.cancel();
        waiter.await.unwrap();
    }
}
