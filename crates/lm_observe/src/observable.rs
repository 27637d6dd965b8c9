//! Observable values and their listener tables.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::Hook;

/// A listener callback. Listeners carry no payload: they are told that the
/// value changed and re-read it through the getter they care about.
pub(crate) type Listener = Arc<dyn Fn() + Send + Sync>;

/// Source of process-unique observable identities, used by hooks to avoid
/// subscribing twice to the same observable.
static NEXT_OBSERVABLE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
pub(crate) struct ListenerTable {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

impl ListenerTable {
    fn insert(&mut self, listener: Listener) -> u64 {
        self.next_id += 1;
        self.entries.push((self.next_id, listener));
        self.next_id
    }

    fn remove(&mut self, id: u64) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }
}

/// Disposer returned by [`Observable::subscribe`].
///
/// Dropping the subscription unsubscribes the listener. Call
/// [`Subscription::detach`] to keep the listener for the lifetime of the
/// observable instead.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    table: Weak<Mutex<ListenerTable>>,
    id: u64,
}

impl Subscription {
    /// Unsubscribe now.
    pub fn dispose(self) {
        drop(self);
    }

    /// Keep the listener subscribed until the observable is dropped.
    pub fn detach(mut self) {
        self.table = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.lock().remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// A value that notifies listeners after every write.
///
/// Writes and notifications are separate steps: the value lock is released
/// before any listener runs, so listeners may freely read (or even write)
/// the observable they were notified by.
pub struct Observable<T> {
    id: u64,
    value: RwLock<T>,
    listeners: Arc<Mutex<ListenerTable>>,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Observable {
            id: NEXT_OBSERVABLE_ID.fetch_add(1, Ordering::Relaxed),
            value: RwLock::new(value),
            listeners: Arc::new(Mutex::new(ListenerTable::default())),
        }
    }

    /// Read the value through `f` without cloning it.
    pub fn with<R>(&self, hook: Option<&Hook>, f: impl FnOnce(&T) -> R) -> R {
        if let Some(hook) = hook {
            self.watch(hook);
        }
        f(&self.value.read())
    }

    /// Replace the value and notify listeners.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
        self.notify();
    }

    /// Replace the value, returning the previous one, and notify listeners.
    pub fn replace(&self, value: T) -> T {
        let old = std::mem::replace(&mut *self.value.write(), value);
        self.notify();
        old
    }

    /// Mutate the value in place and notify listeners.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value.write());
        self.notify();
        result
    }

    /// Mutate the value in place, notifying listeners only if `f` reports
    /// that it changed something.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let changed = f(&mut self.value.write());
        if changed {
            self.notify();
        }
        changed
    }

    /// Register a listener called after every write.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.subscribe_listener(Arc::new(listener))
    }

    /// Number of registered listeners (hooks included).
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    pub(crate) fn subscribe_listener(&self, listener: Listener) -> Subscription {
        let id = self.listeners.lock().insert(listener);
        Subscription {
            table: Arc::downgrade(&self.listeners),
            id,
        }
    }

    fn watch(&self, hook: &Hook) {
        hook.watch(self.id, |callback| self.subscribe_listener(callback));
    }

    fn notify(&self) {
        // Snapshot so listeners can subscribe/unsubscribe while being notified.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl<T: Clone> Observable<T> {
    /// Clone out the current value, subscribing `hook` to later writes.
    pub fn get(&self, hook: Option<&Hook>) -> T {
        self.with(hook, T::clone)
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Observable::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.value.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
