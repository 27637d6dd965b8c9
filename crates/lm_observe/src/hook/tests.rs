use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::Observable;

fn counting_hook() -> (Arc<AtomicUsize>, Hook) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let hook = Hook::new(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (count, hook)
}

#[test]
fn test_hook_subscribes_once_per_observable() {
    let observable = Observable::new("a");
    let (count, hook) = counting_hook();

    observable.get(Some(&hook));
    observable.get(Some(&hook));
    assert_eq!(hook.subscription_count(), 1);
    assert_eq!(observable.listener_count(), 1);

    observable.set("b");
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_hook_watches_many_observables() {
    let left = Observable::new(0);
    let right = Observable::new(0);
    let (count, hook) = counting_hook();

    left.get(Some(&hook));
    right.with(Some(&hook), |_| ());
    left.set(1);
    right.set(1);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_dispose_and_resubscribe() {
    let observable = Observable::new(0);
    let (count, hook) = counting_hook();

    observable.get(Some(&hook));
    hook.dispose();
    assert_eq!(observable.listener_count(), 0);
    observable.set(1);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    observable.get(Some(&hook));
    observable.set(2);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drop_unsubscribes() {
    let observable = Observable::new(0);
    let (count, hook) = counting_hook();
    observable.get(Some(&hook));
    drop(hook);
    observable.set(1);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(observable.listener_count(), 0);
}
