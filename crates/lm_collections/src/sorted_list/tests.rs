use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use lm_observe::Hook;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn ascending() -> SortedList<i32> {
    SortedList::new(|a: &i32, b: &i32| a < b)
}

fn ascending_with(items: &[i32]) -> SortedList<i32> {
    SortedList::with_items(|a: &i32, b: &i32| a < b, items.to_vec())
}

fn snapshot<T: Clone>(list: &SortedList<T>) -> Vec<T> {
    list.get(None).as_ref().clone()
}

/// Pairs ordered by the first component only; the second tags arrival.
fn by_key() -> SortedList<(i32, char)> {
    SortedList::new(|a: &(i32, char), b: &(i32, char)| a.0 < b.0)
}

#[test]
fn test_add_single_items_sorts() {
    let list = ascending();
    for item in [5, 3, 2, 4, 1] {
        list.add(item, None);
    }
    assert_eq!(snapshot(&list), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_add_all_sorts_batch() {
    let list = ascending();
    list.add_all(vec![5, 3, 2, 4, 1], None);
    assert_eq!(snapshot(&list), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_add_all_truncates_to_max_items() {
    let list = ascending_with(&[2, 0, 8, 4, 6]);
    list.add_all(vec![1, 5, 3, 7, 9], Some(8));
    assert_eq!(snapshot(&list), vec![0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_add_truncates_to_max_items() {
    let list = ascending_with(&[1, 2, 3]);
    list.add(0, Some(3));
    assert_eq!(snapshot(&list), vec![0, 1, 2]);
    list.add(9, Some(3));
    assert_eq!(snapshot(&list), vec![0, 1, 2]);
}

#[test]
fn test_single_add_lands_after_ties() {
    let list = by_key();
    list.add((1, 'a'), None);
    list.add((2, 'b'), None);
    list.add((1, 'c'), None);
    assert_eq!(snapshot(&list), vec![(1, 'a'), (1, 'c'), (2, 'b')]);
}

#[test]
fn test_batch_keeps_tie_order_and_follows_existing() {
    let list = by_key();
    list.add((1, 'a'), None);
    list.add_all(vec![(1, 'x'), (0, 'y'), (1, 'z')], None);
    assert_eq!(
        snapshot(&list),
        vec![(0, 'y'), (1, 'a'), (1, 'x'), (1, 'z')]
    );
}

#[test]
fn test_non_strict_comparator_is_accepted() {
    let list = SortedList::with_items(|a: &i32, b: &i32| a <= b, vec![3, 1, 2, 1]);
    assert_eq!(snapshot(&list), vec![1, 1, 2, 3]);
    assert!(list.remove(&1));
    assert_eq!(snapshot(&list), vec![1, 2, 3]);
}

#[test]
fn test_remove_all_matches_single_removal() {
    let batch = ascending_with(&[2, 1, 0, 3, 8, 9, 4, 7, 6, 5]);
    assert!(batch.remove_all(&[1, 5, 3, 7, 9]));
    assert_eq!(snapshot(&batch), vec![0, 2, 4, 6, 8]);

    let single = ascending_with(&[2, 1, 0, 3, 8, 9, 4, 7, 6, 5]);
    for item in [1, 5, 3, 7, 9] {
        assert!(single.remove(&item));
    }
    assert_eq!(snapshot(&single), snapshot(&batch));
}

#[test]
fn test_remove_absent_reports_false() {
    let list = ascending_with(&[1, 2, 3]);
    assert!(!list.remove(&7));
    assert!(!list.remove_all(&[7, 8]));
    assert!(list.remove_all(&[7, 2]));
    assert_eq!(snapshot(&list), vec![1, 3]);
}

#[test]
fn test_remove_within_tie_window_uses_equality() {
    let list = by_key();
    list.add_all(vec![(1, 'a'), (1, 'b'), (1, 'c')], None);
    assert!(list.remove(&(1, 'b')));
    assert!(!list.remove(&(1, 'q')));
    assert!(list.remove_all(&[(1, 'c'), (1, 'a')]));
    assert!(list.is_empty());
}

#[test]
fn test_remove_index() {
    let list = ascending_with(&[10, 20, 30]);
    assert!(list.remove_index(1));
    assert!(!list.remove_index(5));
    assert_eq!(snapshot(&list), vec![10, 30]);
}

#[test]
fn test_remove_indices() {
    let list = ascending_with(&[0, 1, 2, 3, 4, 5]);
    assert!(list.remove_indices([4, 0, 2, 2, 17]));
    assert_eq!(snapshot(&list), vec![1, 3, 5]);
    assert!(!list.remove_indices([3, 9]));
}

#[test]
fn test_find_and_search() {
    let list = ascending_with(&[4, 8, 15, 16, 23, 42]);
    assert_eq!(list.find(&15), Some(2));
    assert_eq!(list.find(&7), None);

    assert_eq!(list.search(|item| item.cmp(&16)), Some((3, 16)));
    assert_eq!(list.search(|item| item.cmp(&17)), None);
}

#[test]
fn test_clear() {
    let list = ascending_with(&[1, 2]);
    list.clear();
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
}

#[test]
fn test_hook_notified_once_per_mutation() {
    let list = ascending();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let hook = Hook::new(move || {
        counter.fetch_add(1, AtomicOrdering::SeqCst);
    });

    list.get(Some(&hook));
    list.add_all(vec![3, 1, 2], None);
    list.add(0, None);
    list.remove(&9);
    list.remove_all(&[1, 2]);
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 3);
}

#[test]
fn test_no_op_writes_do_not_notify() {
    let list = ascending_with(&[1, 2]);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let hook = Hook::new(move || {
        counter.fetch_add(1, AtomicOrdering::SeqCst);
    });

    list.get(Some(&hook));
    list.add_all(vec![], None);
    list.add_all(vec![5, 6], Some(2));
    list.add(9, Some(2));
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 0);
    assert_eq!(snapshot(&list), vec![1, 2]);

    list.clear();
    list.clear();
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
}

#[test]
fn test_snapshot_is_stable_across_writes() {
    let list = ascending_with(&[1, 2]);
    let before = list.get(None);
    list.add(0, None);
    assert_eq!(*before, vec![1, 2]);
    assert_eq!(snapshot(&list), vec![0, 1, 2]);
}

fn is_sorted(items: &[i32]) -> bool {
    items.windows(2).all(|pair| pair[0] <= pair[1])
}

proptest! {
    #[test]
    fn prop_mixed_operations_stay_sorted(
        singles in proptest::collection::vec(-50i32..50, 0..20),
        batch in proptest::collection::vec(-50i32..50, 0..40),
        removals in proptest::collection::vec(-50i32..50, 0..20),
        max in proptest::option::of(1usize..60),
    ) {
        let list = ascending();
        for item in singles {
            list.add(item, None);
        }
        list.add_all(batch, max);
        list.remove_all(&removals);
        let items = snapshot(&list);
        prop_assert!(is_sorted(&items));
        if let Some(max) = max {
            prop_assert!(items.len() <= max);
        }
    }

    #[test]
    fn prop_batch_removal_matches_single_removal(
        items in proptest::collection::hash_set(-100i32..100, 0..50),
        removals in proptest::collection::hash_set(-100i32..100, 0..30),
    ) {
        let items: Vec<i32> = items.into_iter().collect();
        let removals: Vec<i32> = removals.into_iter().collect();

        let batch = ascending_with(&items);
        let single = ascending_with(&items);
        batch.remove_all(&removals);
        for item in &removals {
            single.remove(item);
        }
        prop_assert_eq!(snapshot(&batch), snapshot(&single));
    }

    #[test]
    fn prop_truncation_keeps_smallest(
        existing in proptest::collection::vec(-100i32..100, 0..30),
        incoming in proptest::collection::vec(-100i32..100, 0..30),
        max in 0usize..40,
    ) {
        let list = ascending_with(&existing);
        list.add_all(incoming.clone(), Some(max));

        let mut expected = existing;
        expected.extend(incoming);
        expected.sort_unstable();
        expected.truncate(max);
        prop_assert_eq!(snapshot(&list), expected);
    }
}
