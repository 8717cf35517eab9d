use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Single-slot, latest-wins mailbox between two threads.
///
/// `submit` replaces whatever is stored, so a consumer only ever sees the
/// most recent value, and always sees it whole.
pub struct LatestSlot<T> {
    value: Mutex<Option<T>>,
    changed: Condvar,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            changed: Condvar::new(),
        }
    }

    /// Stores `value` and returns the unconsumed value it displaced, if any.
    pub fn submit(&self, value: T) -> Option<T> {
        let displaced = self.lock().replace(value);
        self.changed.notify_all();
        displaced
    }

    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Takes the stored value, waiting at most `timeout` for one to arrive.
    ///
    /// Returns early (possibly with `None`) when [`wake_all`](Self::wake_all)
    /// is called.
    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        let guard = self.lock();
        if guard.is_some() {
            return self.take_from(guard);
        }
        let (guard, _) = self
            .changed
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        self.take_from(guard)
    }

    /// Waits at most `timeout` for the slot to hold a value, without taking it.
    pub fn wait_filled(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |value| value.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        guard.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Wakes every waiter so it can re-check external state such as a stop flag.
    pub fn wake_all(&self) {
        let _guard = self.lock();
        self.changed.notify_all();
    }

    fn take_from(&self, mut guard: MutexGuard<'_, Option<T>>) -> Option<T> {
        guard.take()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
