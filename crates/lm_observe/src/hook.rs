//! Data hooks: caller-owned listener handles passed to getters.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::observable::{Listener, Subscription};

/// A change listener that getters subscribe on read.
///
/// A hook may be handed to any number of getters on any number of
/// observables. Every observable it reads is watched exactly once; the
/// callback then fires after each write to any of them. Dropping the hook
/// (or calling [`Hook::dispose`]) removes all of its subscriptions.
pub struct Hook {
    callback: Listener,
    subscriptions: Mutex<FxHashMap<u64, Subscription>>,
}

impl Hook {
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Hook {
            callback: Arc::new(callback),
            subscriptions: Mutex::new(FxHashMap::default()),
        }
    }

    /// Unsubscribe from everything read so far. The hook stays usable and
    /// will resubscribe on its next read.
    pub fn dispose(&self) {
        let drained: Vec<Subscription> = self
            .subscriptions
            .lock()
            .drain()
            .map(|(_, subscription)| subscription)
            .collect();
        drop(drained);
    }

    /// Number of observables this hook is subscribed to.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Subscribe to observable `id` unless already subscribed.
    pub(crate) fn watch(&self, id: u64, subscribe: impl FnOnce(Listener) -> Subscription) {
        let mut subscriptions = self.subscriptions.lock();
        subscriptions
            .entry(id)
            .or_insert_with(|| subscribe(Arc::clone(&self.callback)));
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
