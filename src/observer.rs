//! Ordered publish/subscribe fan-out
//!
//! A [`Subject`] keeps observers in registration order and invokes them
//! synchronously on the notifying thread.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Identifies one registration for later removal
///
/// Ids are never reused, so registering the same closure twice yields two
/// distinct ids and two invocations per notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

pub struct Subject<T> {
    observers: Mutex<Vec<(ObserverId, Observer<T>)>>,
    next_id: AtomicU64,
}

impl<T> Subject<T> {
    pub fn new() -> Self {
        Subject {
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Appends an observer and returns its id
    pub fn register_observer<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(observer)));
        id
    }

    /// Removes a registration
    ///
    /// Returns `false` if the id was not (or no longer) registered.
    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.lock();
        match observers.iter().position(|(existing, _)| *existing == id) {
            Some(index) => {
                observers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Invokes every registered observer in registration order
    ///
    /// The observer list is snapshotted before the first call, so observers
    /// may register or unregister from inside a notification. Such changes
    /// only affect later passes.
    pub fn notify_all(&self, payload: &T) {
        let snapshot: Vec<Observer<T>> = self
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in snapshot {
            observer(payload);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ObserverId, Observer<T>)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("observers", &self.len())
            .finish()
    }
}
