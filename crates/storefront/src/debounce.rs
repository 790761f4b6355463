//! Cancellable deferred tasks.
//!
//! A [`Debouncer`] is a single-slot work queue with replace-on-arrival
//! semantics: scheduling a task cancels the previous one if its timer has
//! not fired yet. Once the timer fires, the work is detached from the slot
//! and runs to completion even if something new is scheduled meanwhile.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

/// Handle to one scheduled task.
#[derive(Debug, Clone)]
pub struct DeferredHandle {
    timer: AbortHandle,
}

impl DeferredHandle {
    /// Cancel the task if its timer has not fired yet.
    pub fn cancel(&self) {
        self.timer.abort();
    }

    /// Whether the timer has fired or been cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.timer.is_finished()
    }
}

/// Schedule `task` to run after `delay` on the current tokio runtime.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn schedule<F>(delay: Duration, task: F) -> DeferredHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let timer = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // Detach so that aborting the timer can no longer interrupt the work.
        tokio::spawn(task);
    });

    DeferredHandle {
        timer: timer.abort_handle(),
    }
}

/// Single-slot debouncer with a fixed delay.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    slot: Mutex<Option<DeferredHandle>>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    fn slot(&self) -> MutexGuard<'_, Option<DeferredHandle>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule `task`, cancelling whatever was pending.
    pub fn schedule<F>(&self, task: F) -> DeferredHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = schedule(self.delay, task);
        if let Some(previous) = self.slot().replace(handle.clone()) {
            previous.cancel();
        }
        handle
    }

    /// Cancel the pending task, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.slot().take() {
            previous.cancel();
        }
    }

    /// Whether a task is waiting for its timer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
