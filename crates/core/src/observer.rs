//! Subscribable state container.
//!
//! Every store owns one `Observable` and mutates it only through
//! `update`/`try_update`. A mutation (including any persistence the caller
//! does inside it) runs under the write lock, so concurrent writers are
//! serialized. Subscribers run after the write lock is released, in commit
//! order; a snapshot older than one already delivered is skipped. Callbacks
//! may read the container but must not mutate it.

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Versioned<T> {
    version: u64,
    value: T,
}

pub struct Observable<T> {
    state: RwLock<Versioned<T>>,
    subscribers: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
    delivered: Mutex<u64>,
    next_id: AtomicU64,
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: RwLock::new(Versioned {
                version: 0,
                value: initial,
            }),
            subscribers: Mutex::new(Vec::new()),
            delivered: Mutex::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of the current state.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Read a projection of the state without cloning all of it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard.value)
    }

    /// Mutate the state, then notify every subscriber with the new snapshot.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        match self.try_update(|state| Ok::<R, Infallible>(f(state))) {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Fallible mutation. `f` works on a copy; the copy replaces the state
    /// only if `f` succeeds, and nothing is published on error.
    pub fn try_update<R, E>(&self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E> {
        let (result, version, snapshot) = {
            let mut guard = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut next = guard.value.clone();
            let result = f(&mut next)?;
            guard.version += 1;
            guard.value = next;
            (result, guard.version, guard.value.clone())
        };
        self.publish(version, &snapshot);
        Ok(result)
    }

    /// Replace the state wholesale and notify.
    pub fn set(&self, value: T) {
        self.update(|state| *state = value);
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(callback)));
        id
    }

    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn publish(&self, version: u64, snapshot: &T) {
        let mut delivered = self
            .delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if version <= *delivered {
            return;
        }
        *delivered = version;

        // Clone the list so callbacks may (un)subscribe without deadlocking.
        let callbacks: Vec<Callback<T>> = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }
}

impl<T: Clone + core::fmt::Debug> core::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Observable")
            .field("state", &self.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
