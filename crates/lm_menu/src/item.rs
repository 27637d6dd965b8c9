//! Menu entries.

use std::fmt;
use std::sync::Arc;

/// An item with the priority it is sorted by.
///
/// Items are shared handles and compared by identity: two entries are the
/// same item only if they point at the same allocation.
pub struct PrioritizedItem<I> {
    pub priority: f64,
    pub item: Arc<I>,
}

impl<I> PrioritizedItem<I> {
    pub fn new(priority: f64, item: Arc<I>) -> Self {
        PrioritizedItem { priority, item }
    }

    /// Check if this entry wraps `item`.
    pub fn wraps(&self, item: &Arc<I>) -> bool {
        Arc::ptr_eq(&self.item, item)
    }
}

impl<I> Clone for PrioritizedItem<I> {
    fn clone(&self) -> Self {
        PrioritizedItem {
            priority: self.priority,
            item: Arc::clone(&self.item),
        }
    }
}

#[allow(
    clippy::float_cmp,
    reason = "entries are equal only when they carry the exact same priority"
)]
impl<I> PartialEq for PrioritizedItem<I> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && Arc::ptr_eq(&self.item, &other.item)
    }
}

impl<I: fmt::Debug> fmt::Debug for PrioritizedItem<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrioritizedItem")
            .field("priority", &self.priority)
            .field("item", &self.item)
            .finish()
    }
}
