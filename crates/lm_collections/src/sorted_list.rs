//! Observable list kept in comparator order.
//!
//! Single-item operations locate their position by binary search and shift
//! the tail (O(n)). Batch operations sort the batch once and then do a single
//! linear merge against the existing items, O(k log k + n) for k new items,
//! which is what makes bursty async producers affordable.
//!
//! # Ordering
//!
//! The list is ordered by a `precedes(a, b)` predicate: "a sorts at or before
//! b". Two items are *tied* when neither strictly precedes the other. Ties
//! keep arrival order: a single insert lands after its existing ties, a batch
//! keeps its own internal order and lands after existing ties too.

use std::cmp::Ordering;
use std::sync::Arc;

use lm_observe::{Hook, Observable};
use tracing::trace;

type Precedes<T> = dyn Fn(&T, &T) -> bool + Send + Sync;

/// A list that stays sorted under a caller-supplied order.
///
/// The current items are published as an `Arc<Vec<T>>` snapshot; each
/// mutating call replaces the snapshot (copy-on-write) and notifies hooks
/// once, after the mutation.
///
/// The comparator must not access the list it orders.
pub struct SortedList<T> {
    precedes: Box<Precedes<T>>,
    items: Observable<Arc<Vec<T>>>,
}

impl<T: Clone> SortedList<T> {
    /// Create an empty list ordered by `precedes`.
    pub fn new(precedes: impl Fn(&T, &T) -> bool + Send + Sync + 'static) -> Self {
        SortedList {
            precedes: Box::new(precedes),
            items: Observable::new(Arc::new(Vec::new())),
        }
    }

    /// Create a list holding `items`, sorted by `precedes`.
    pub fn with_items(
        precedes: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
        items: Vec<T>,
    ) -> Self {
        let list = SortedList::new(precedes);
        list.add_all(items, None);
        list
    }

    /// Strict precedence: `a` sorts before `b` and they are not tied.
    #[inline]
    fn before(&self, a: &T, b: &T) -> bool {
        (self.precedes)(a, b) && !(self.precedes)(b, a)
    }

    fn ordering(&self, a: &T, b: &T) -> Ordering {
        if self.before(a, b) {
            Ordering::Less
        } else if self.before(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// The current items, subscribing `hook` to later replacements.
    pub fn get(&self, hook: Option<&Hook>) -> Arc<Vec<T>> {
        self.items.get(hook)
    }

    pub fn len(&self) -> usize {
        self.items.with(None, |items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Search by key rather than by item.
    ///
    /// `compare` reports where an element sits relative to the searched key:
    /// `Less` if the element sorts before it, `Equal` on a match, `Greater`
    /// after. Returns the first matching index and item.
    pub fn search(&self, mut compare: impl FnMut(&T) -> Ordering) -> Option<(usize, T)> {
        self.items.with(None, |items| {
            let index = items.partition_point(|item| compare(item) == Ordering::Less);
            items
                .get(index)
                .filter(|item| compare(item) == Ordering::Equal)
                .map(|item| (index, item.clone()))
        })
    }

    /// Add one item after its existing ties, keeping at most `max_items`.
    /// Listeners are not notified when the item sorts past a full list.
    pub fn add(&self, item: T, max_items: Option<usize>) {
        self.items.update_if(|items| {
            let index = items.partition_point(|existing| !self.before(&item, existing));
            let limit = max_items.unwrap_or(usize::MAX);
            if index >= limit && items.len() <= limit {
                return false;
            }
            let list = Arc::make_mut(items);
            list.insert(index, item);
            list.truncate(limit);
            true
        });
    }

    /// Merge a batch of items into the list, keeping at most `max_items`.
    ///
    /// Truncation always keeps the earliest-sorted items of the merge.
    /// Listeners are not notified when the merge leaves the list unchanged.
    pub fn add_all(&self, items: Vec<T>, max_items: Option<usize>) {
        let mut incoming = items;
        // Stable: ties keep their order within the batch.
        incoming.sort_by(|a, b| self.ordering(a, b));
        let limit = max_items.unwrap_or(usize::MAX);

        self.items.update_if(|items| {
            if incoming.is_empty() && items.len() <= limit {
                return false;
            }
            let existing = std::mem::take(Arc::make_mut(items));
            trace!(
                existing = existing.len(),
                incoming = incoming.len(),
                limit,
                "merging batch into sorted list"
            );

            let mut merged = Vec::with_capacity((existing.len() + incoming.len()).min(limit));
            let mut old = existing.into_iter().peekable();
            let mut new = incoming.into_iter().peekable();
            let mut changed = false;
            while merged.len() < limit {
                let take_new = match (old.peek(), new.peek()) {
                    (Some(o), Some(n)) => self.before(n, o),
                    (None, Some(_)) => true,
                    (Some(_), None) => false,
                    (None, None) => break,
                };
                changed |= take_new;
                let next = if take_new { new.next() } else { old.next() };
                merged.extend(next);
            }
            changed |= old.peek().is_some();
            *items = Arc::new(merged);
            changed
        });
    }

    /// Remove the first item equal to `item`. Returns whether it was present.
    pub fn remove(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.items.update_if(|items| match self.position(items, item) {
            Some(index) => {
                Arc::make_mut(items).remove(index);
                true
            }
            None => false,
        })
    }

    /// Remove every item equal to one of `targets` in a single pass.
    pub fn remove_all(&self, targets: &[T]) -> bool
    where
        T: PartialEq,
    {
        let mut keys: Vec<&T> = targets.iter().collect();
        keys.sort_by(|a, b| self.ordering(a, b));

        self.items.update_if(|items| {
            let mut cursor = 0;
            let doomed: Vec<bool> = items
                .iter()
                .map(|item| {
                    while cursor < keys.len() && self.before(keys[cursor], item) {
                        cursor += 1;
                    }
                    keys[cursor..]
                        .iter()
                        .take_while(|key| !self.before(item, key))
                        .any(|key| *key == item)
                })
                .collect();
            if !doomed.contains(&true) {
                return false;
            }

            let mut flags = doomed.into_iter();
            Arc::make_mut(items).retain(|_| !flags.next().unwrap_or(false));
            true
        })
    }

    /// Remove the item at `index`. Returns false if out of bounds.
    pub fn remove_index(&self, index: usize) -> bool {
        self.items.update_if(|items| {
            if index >= items.len() {
                return false;
            }
            Arc::make_mut(items).remove(index);
            true
        })
    }

    /// Remove the items at all of `indices` in a single pass.
    pub fn remove_indices(&self, indices: impl IntoIterator<Item = usize>) -> bool {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();

        self.items.update_if(|items| {
            let in_bounds = indices.partition_point(|&i| i < items.len());
            if in_bounds == 0 {
                return false;
            }

            let mut doomed = indices[..in_bounds].iter().copied().peekable();
            let mut position = 0;
            Arc::make_mut(items).retain(|_| {
                let remove = doomed.next_if_eq(&position).is_some();
                position += 1;
                !remove
            });
            true
        })
    }

    /// Index of `item`, found by binary search to its tie window.
    pub fn find(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.items.with(None, |items| self.position(items, item))
    }

    /// Remove all items.
    pub fn clear(&self) {
        self.items.update_if(|items| {
            let had_items = !items.is_empty();
            if had_items {
                *items = Arc::new(Vec::new());
            }
            had_items
        });
    }

    fn position(&self, items: &[T], item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        let start = items.partition_point(|existing| self.before(existing, item));
        items[start..]
            .iter()
            .take_while(|existing| !self.before(item, existing))
            .position(|existing| existing == item)
            .map(|offset| start + offset)
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for SortedList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortedList")
            .field("items", &self.get(None))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
