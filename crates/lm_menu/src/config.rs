//! Menu configuration.

use std::time::Duration;

/// Direction items are sorted by priority.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    HighestFirst,
    LowestFirst,
}

impl SortOrder {
    /// Check if priority `a` sorts at or before priority `b`.
    pub fn precedes(self, a: f64, b: f64) -> bool {
        match self {
            SortOrder::HighestFirst => a >= b,
            SortOrder::LowestFirst => a <= b,
        }
    }

    /// Signed offset that moves a priority one step later in this order.
    pub(crate) fn later(self, step: f64) -> f64 {
        match self {
            SortOrder::HighestFirst => -step,
            SortOrder::LowestFirst => step,
        }
    }
}

/// Options of an [`AsyncMenu`](crate::AsyncMenu).
#[derive(Clone, Debug, PartialEq)]
pub struct MenuConfig {
    /// Quiet period after the last batched insert before the batch is
    /// merged into the list.
    pub batch_delay: Duration,
    /// Keep at most this many items, dropping the latest-sorted ones.
    pub max_items: Option<usize>,
    pub order: SortOrder,
}

impl Default for MenuConfig {
    fn default() -> Self {
        MenuConfig {
            batch_delay: Duration::from_millis(100),
            max_items: None,
            order: SortOrder::HighestFirst,
        }
    }
}

impl MenuConfig {
    #[must_use]
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}
