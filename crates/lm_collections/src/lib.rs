//! Collections backing the menu and lookup layers.
//!
//! - [`SortedList`]: observable list kept in comparator order, with
//!   merge-based batch insertion and removal
//! - [`SearchCache`]: bounded memoization keyed by key paths of any arity
//! - [`Queue`]: FIFO used for the cache's eviction order

mod queue;
mod search_cache;
mod sorted_list;

pub use queue::Queue;
pub use search_cache::SearchCache;
pub use sorted_list::SortedList;
