//! Bounded memoization keyed by key paths of any arity.
//!
//! Entries live in a trie of hash maps, one level per key component, so a
//! composite key such as `(term, language)` needs no string concatenation
//! and shares prefixes naturally. A FIFO queue of inserted key paths bounds
//! the number of entries.
//!
//! # Eviction
//!
//! Eviction is strictly by insertion order: a cache hit does not refresh an
//! entry's age. Evicting an entry also prunes every trie level it leaves
//! empty.

use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::Queue;

type Create<K, V> = dyn Fn(&[K]) -> V + Send + Sync;

struct TrieNode<K, V> {
    value: Option<V>,
    children: FxHashMap<K, TrieNode<K, V>>,
}

impl<K: Eq + Hash, V> TrieNode<K, V> {
    fn new() -> Self {
        TrieNode {
            value: None,
            children: FxHashMap::default(),
        }
    }

    fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }

    fn lookup(&self, keys: &[K]) -> Option<&V> {
        match keys.split_first() {
            None => self.value.as_ref(),
            Some((head, rest)) => self.children.get(head)?.lookup(rest),
        }
    }

    /// Store `value` at `keys`, creating intermediate levels as needed.
    /// Returns whether a new entry was created.
    fn insert(&mut self, keys: &[K], value: V) -> bool
    where
        K: Clone,
    {
        let mut node = self;
        for key in keys {
            node = node
                .children
                .entry(key.clone())
                .or_insert_with(TrieNode::new);
        }
        node.value.replace(value).is_none()
    }

    /// Remove the entry at `keys`, pruning levels left empty on the way up.
    fn remove(&mut self, keys: &[K]) -> Option<V> {
        match keys.split_first() {
            None => self.value.take(),
            Some((head, rest)) => {
                let child = self.children.get_mut(head)?;
                let removed = child.remove(rest);
                if child.is_empty() {
                    self.children.remove(head);
                }
                removed
            }
        }
    }
}

struct CacheState<K, V> {
    root: TrieNode<K, V>,
    /// Key paths in insertion order; the front is evicted first.
    queue: Queue<Vec<K>>,
}

/// Memoizes `create(keys)` for up to `max_size` distinct key paths.
///
/// The creation function runs at most once per key path while that path
/// stays cached. It runs outside the cache lock, so it may itself use the
/// cache; if two callers race on the same miss, the first stored value wins
/// and both receive it.
pub struct SearchCache<K, V> {
    max_size: usize,
    create: Box<Create<K, V>>,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> SearchCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_size: usize, create: impl Fn(&[K]) -> V + Send + Sync + 'static) -> Self {
        SearchCache {
            max_size,
            create: Box::new(create),
            state: Mutex::new(CacheState {
                root: TrieNode::new(),
                queue: Queue::new(),
            }),
        }
    }

    /// The cached value for `keys`, creating it on a miss.
    pub fn get(&self, keys: &[K]) -> V {
        if let Some(value) = self.state.lock().root.lookup(keys) {
            return value.clone();
        }

        let value = (self.create)(keys);

        let mut state = self.state.lock();
        if let Some(existing) = state.root.lookup(keys) {
            return existing.clone();
        }
        if state.root.insert(keys, value.clone()) {
            state.queue.push(keys.to_vec());
        }
        while state.queue.len() > self.max_size {
            let Some(oldest) = state.queue.pop() else {
                break;
            };
            state.root.remove(&oldest);
            debug!(
                arity = oldest.len(),
                size = state.queue.len(),
                "evicted oldest search cache entry"
            );
        }
        value
    }

    /// Batch form of [`SearchCache::get`], one value per key path.
    pub fn get_all<I, P>(&self, key_paths: I) -> Vec<V>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[K]>,
    {
        key_paths
            .into_iter()
            .map(|path| self.get(path.as_ref()))
            .collect()
    }

    /// Shorthand for caches keyed by a single component.
    pub fn get_each(&self, keys: &[K]) -> Vec<V> {
        keys.iter()
            .map(|key| self.get(std::slice::from_ref(key)))
            .collect()
    }

    /// Check if `keys` is cached, without creating it.
    pub fn contains(&self, keys: &[K]) -> bool {
        self.state.lock().root.lookup(keys).is_some()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.root = TrieNode::new();
        state.queue.clear();
    }
}

impl<K, V> std::fmt::Debug for SearchCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("max_size", &self.max_size)
            .field("len", &self.state.lock().queue.len())
            .finish_non_exhaustive()
    }
}
