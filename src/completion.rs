use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One-shot completion marker
///
/// Moves from unsignaled to signaled once and never back. Any number of
/// threads may wait on it; all are released by the single `complete` call.
#[derive(Debug, Default)]
pub struct Completion {
    done: Mutex<bool>,
    cond: Condvar,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals the marker and wakes all waiters
    ///
    /// Returns `false` if it was already signaled.
    pub fn complete(&self) -> bool {
        let mut done = self.lock();
        if *done {
            return false;
        }
        *done = true;
        self.cond.notify_all();
        true
    }

    pub fn is_completed(&self) -> bool {
        *self.lock()
    }

    /// Blocks until the marker is signaled
    pub fn wait(&self) {
        let done = self.lock();
        let _done = self
            .cond
            .wait_while(done, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks for at most `timeout`, returning whether the marker was signaled
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let done = self.lock();
        let (done, _) = self
            .cond
            .wait_timeout_while(done, timeout, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
        *done
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
