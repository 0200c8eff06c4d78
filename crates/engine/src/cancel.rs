//! Cooperative cancellation
//!
//! A grab checks the flag at the top of every iteration; the ring driver
//! additionally races its inter-iteration sleep against it. Cancellation
//! between iterations means an interrupted grab leaves a shortened but
//! locally consistent series: every committed chunk was individually
//! verified.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable cancellation handle
///
/// All clones share one flag. Typically one clone is wired to a signal
/// handler and the engine holds another.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<Inner>,
}

impl CancelFlag {
    /// Create a fresh, uncancelled flag
    pub fn new() -> Self {
        CancelFlag::default()
    }

    /// Request cancellation and wake every waiter
    ///
    /// Idempotent; there is no un-cancel.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until cancellation is requested
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            let notified = self.inner.notify.notified();
            // Re-check after arming the waiter to close the set/await race
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
