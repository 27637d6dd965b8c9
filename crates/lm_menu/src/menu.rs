//! Priority-ordered menu fed by static items and async generators.
//!
//! Items are kept in a [`SortedList`] of [`PrioritizedItem`]s. Inserts can
//! be batched: batched items wait in a pending buffer until no further
//! batched insert arrived for [`MenuConfig::batch_delay`], then the whole
//! buffer is merged with one [`SortedList::add_all`]. Reading the items
//! flushes the buffer early.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};

use lm_collections::SortedList;
use lm_observe::{Hook, Observable};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::config::MenuConfig;
use crate::extractor::{Emitter, ExtractError, GeneratorStreamExtractor};
use crate::item::PrioritizedItem;

/// Priority given to the first item of an empty menu.
pub const DEFAULT_PRIORITY: f64 = 1e5;
/// Distance kept from the only neighbour when inserting at either end.
pub const PRIORITY_STEP: f64 = 1e5;

/// A boxed item generator, as accepted by [`MenuSource::Generator`].
pub type ItemGenerator<I> =
    Box<dyn FnOnce(Emitter<Arc<I>>) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Initial content of a menu.
pub enum MenuSource<I> {
    Items(Vec<Arc<I>>),
    Generator(ItemGenerator<I>),
}

impl<I> MenuSource<I> {
    pub fn generator<G, Fut>(generator: G) -> Self
    where
        G: FnOnce(Emitter<Arc<I>>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        MenuSource::Generator(Box::new(move |emitter| Box::pin(generator(emitter))))
    }
}

impl<I> fmt::Debug for MenuSource<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuSource::Items(items) => f.debug_tuple("Items").field(&items.len()).finish(),
            MenuSource::Generator(_) => f.write_str("Generator"),
        }
    }
}

struct Batch<I> {
    pending: Vec<PrioritizedItem<I>>,
    timer: Option<JoinHandle<()>>,
}

struct MenuInner<I> {
    config: MenuConfig,
    items: SortedList<PrioritizedItem<I>>,
    cursor: Observable<Option<Arc<I>>>,
    selected: Observable<Vec<Arc<I>>>,
    generators: Observable<Vec<GeneratorStreamExtractor<Arc<I>>>>,
    batch: Mutex<Batch<I>>,
}

impl<I> MenuInner<I> {
    fn flush(&self) {
        let pending = {
            let mut batch = self.batch.lock();
            if let Some(timer) = batch.timer.take() {
                timer.abort();
            }
            std::mem::take(&mut batch.pending)
        };
        if pending.is_empty() {
            return;
        }
        debug!(count = pending.len(), "flushing batched menu items");
        self.items.add_all(pending, self.config.max_items);
    }

    fn forget_generator(&self, extractor: &GeneratorStreamExtractor<Arc<I>>) {
        self.generators.update_if(|generators| {
            let before = generators.len();
            generators.retain(|generator| !generator.ptr_eq(extractor));
            generators.len() != before
        });
    }
}

impl<I> Drop for MenuInner<I> {
    fn drop(&mut self) {
        if let Some(timer) = self.batch.get_mut().timer.take() {
            timer.abort();
        }
        for generator in self.generators.get(None) {
            generator.stop();
        }
    }
}

/// A live, priority-ordered item collection with cursor and selection.
///
/// Cheap to clone; clones share the same menu.
pub struct AsyncMenu<I> {
    inner: Arc<MenuInner<I>>,
}

impl<I: Send + Sync + 'static> AsyncMenu<I> {
    pub fn new(config: MenuConfig) -> Self {
        let order = config.order;
        AsyncMenu {
            inner: Arc::new(MenuInner {
                config,
                items: SortedList::new(move |a: &PrioritizedItem<I>, b: &PrioritizedItem<I>| {
                    order.precedes(a.priority, b.priority)
                }),
                cursor: Observable::new(None),
                selected: Observable::new(Vec::new()),
                generators: Observable::new(Vec::new()),
                batch: Mutex::new(Batch {
                    pending: Vec::new(),
                    timer: None,
                }),
            }),
        }
    }

    /// Create a menu filled from `source`.
    ///
    /// Generator items are batched. Starting a generator needs a tokio
    /// runtime.
    pub fn with_source(source: MenuSource<I>, config: MenuConfig) -> Result<Self, ExtractError> {
        let menu = AsyncMenu::new(config);
        match source {
            MenuSource::Items(items) => menu.add_items(items, false),
            MenuSource::Generator(generator) => {
                // Removal from the generator list does not depend on this future.
                drop(menu.add_generator(generator, true)?);
            }
        }
        Ok(menu)
    }

    pub fn config(&self) -> &MenuConfig {
        &self.inner.config
    }

    /// Add `item` after every item currently in the menu.
    pub fn add_item(&self, item: Arc<I>, batch: bool) {
        let priority = self.tail_priority();
        self.add_prioritized_item(PrioritizedItem::new(priority, item), batch);
    }

    /// Add `item` so it sorts at `index` of the current items.
    ///
    /// The priority is derived from the neighbours at `index - 1` and
    /// `index`. Pending batched items are not taken into account.
    pub fn add_item_at(&self, item: Arc<I>, index: usize, batch: bool) {
        let priority = self.priority_at(index);
        self.add_prioritized_item(PrioritizedItem::new(priority, item), batch);
    }

    pub fn add_prioritized_item(&self, item: PrioritizedItem<I>, batch: bool) {
        if batch {
            self.enqueue(item);
        } else {
            self.inner.items.add(item, self.inner.config.max_items);
        }
    }

    pub fn add_items(&self, items: impl IntoIterator<Item = Arc<I>>, batch: bool) {
        for item in items {
            self.add_item(item, batch);
        }
    }

    /// Feed the menu from `generator`.
    ///
    /// The generator is tracked in [`generators`](Self::get_generators)
    /// until it returns or is stopped. The returned future resolves at that
    /// point.
    pub fn add_generator<G, Fut>(
        &self,
        generator: G,
        batch: bool,
    ) -> Result<impl Future<Output = ()> + Send + 'static, ExtractError>
    where
        G: FnOnce(Emitter<Arc<I>>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let menu = Arc::downgrade(&self.inner);
        let extractor = GeneratorStreamExtractor::new(generator, move |item: Arc<I>| {
            if let Some(inner) = menu.upgrade() {
                AsyncMenu { inner }.add_item(item, batch);
            }
        });

        self.inner
            .generators
            .update(|generators| generators.push(extractor.clone()));
        let finished = match extractor.start() {
            Ok(finished) => finished,
            Err(err) => {
                self.inner.forget_generator(&extractor);
                return Err(err);
            }
        };
        debug!("generator added to menu");

        let untrack = untrack_on_completion(Arc::downgrade(&self.inner), extractor.clone());
        if let Ok(runtime) = Handle::try_current() {
            runtime.spawn(untrack);
        }
        let menu = Arc::downgrade(&self.inner);
        Ok(async move {
            finished.await;
            if let Some(inner) = menu.upgrade() {
                inner.forget_generator(&extractor);
            }
        })
    }

    /// Remove the entry wrapping `item`, batched or not.
    pub fn remove_item(&self, item: &Arc<I>) -> bool {
        let pending = self.remove_pending(|entry| entry.wraps(item));
        let entry = self
            .inner
            .items
            .get(None)
            .iter()
            .find(|entry| entry.wraps(item))
            .cloned();
        let listed = entry.is_some_and(|entry| self.inner.items.remove(&entry));
        pending || listed
    }

    pub fn remove_prioritized_item(&self, item: &PrioritizedItem<I>) -> bool {
        let pending = self.remove_pending(|entry| entry == item);
        let listed = self.inner.items.remove(item);
        pending || listed
    }

    /// Merge pending batched items into the list now.
    pub fn flush(&self) {
        self.inner.flush();
    }

    /// The items in sort order. Pending batched items are flushed first.
    pub fn get_items(&self, hook: Option<&Hook>) -> Vec<Arc<I>> {
        self.get_prioritized_items(hook)
            .iter()
            .map(|entry| Arc::clone(&entry.item))
            .collect()
    }

    /// The entries in sort order. Pending batched items are flushed first.
    pub fn get_prioritized_items(&self, hook: Option<&Hook>) -> Arc<Vec<PrioritizedItem<I>>> {
        self.inner.flush();
        self.inner.items.get(hook)
    }

    pub fn set_selected(&self, item: &Arc<I>, selected: bool) {
        self.inner.selected.update_if(|items| {
            let present = items.iter().any(|existing| Arc::ptr_eq(existing, item));
            match (selected, present) {
                (true, false) => {
                    items.push(Arc::clone(item));
                    true
                }
                (false, true) => {
                    items.retain(|existing| !Arc::ptr_eq(existing, item));
                    true
                }
                _ => false,
            }
        });
    }

    pub fn get_selected(&self, hook: Option<&Hook>) -> Vec<Arc<I>> {
        self.inner.selected.get(hook)
    }

    pub fn set_cursor(&self, item: Option<Arc<I>>) {
        self.inner.cursor.set(item);
    }

    /// The explicit cursor, or else the first item in sort order.
    /// Pending batched items are flushed before falling back.
    pub fn get_cursor(&self, hook: Option<&Hook>) -> Option<Arc<I>> {
        self.inner.cursor.get(hook).or_else(|| {
            self.get_prioritized_items(hook)
                .first()
                .map(|entry| Arc::clone(&entry.item))
        })
    }

    /// Generators still feeding the menu.
    pub fn get_generators(&self, hook: Option<&Hook>) -> Vec<GeneratorStreamExtractor<Arc<I>>> {
        self.inner.generators.get(hook)
    }

    pub fn is_loading(&self, hook: Option<&Hook>) -> bool {
        self.inner
            .generators
            .with(hook, |generators| !generators.is_empty())
    }

    pub fn stop_generators(&self) {
        for generator in self.inner.generators.get(None) {
            generator.stop();
        }
    }

    fn priority_at(&self, index: usize) -> f64 {
        let order = self.inner.config.order;
        let items = self.inner.items.get(None);
        let index = index.min(items.len());
        let before = index
            .checked_sub(1)
            .and_then(|i| items.get(i))
            .map(|entry| entry.priority);
        let after = items.get(index).map(|entry| entry.priority);
        match (before, after) {
            (Some(before), Some(after)) => (before + after) / 2.0,
            (Some(before), None) => before + order.later(PRIORITY_STEP),
            (None, Some(after)) => after - order.later(PRIORITY_STEP),
            (None, None) => DEFAULT_PRIORITY,
        }
    }

    /// Priority that sorts after the listed and the pending items.
    fn tail_priority(&self) -> f64 {
        let order = self.inner.config.order;
        let listed = self.inner.items.get(None).last().map(|entry| entry.priority);
        let pending = self
            .inner
            .batch
            .lock()
            .pending
            .iter()
            .map(|entry| entry.priority)
            .reduce(|a, b| if order.precedes(a, b) { b } else { a });
        let last = match (listed, pending) {
            (Some(a), Some(b)) if order.precedes(a, b) => Some(b),
            (Some(a), _) => Some(a),
            (None, b) => b,
        };
        last.map_or(DEFAULT_PRIORITY, |last| last + order.later(PRIORITY_STEP))
    }

    fn enqueue(&self, item: PrioritizedItem<I>) {
        let runtime = Handle::try_current().ok();
        {
            let mut batch = self.inner.batch.lock();
            batch.pending.push(item);
            if let Some(timer) = batch.timer.take() {
                timer.abort();
            }
            if let Some(runtime) = &runtime {
                let menu = Arc::downgrade(&self.inner);
                let delay = self.inner.config.batch_delay;
                trace!(pending = batch.pending.len(), "re-arming batch timer");
                batch.timer = Some(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(inner) = menu.upgrade() {
                        inner.flush();
                    }
                }));
            }
        }
        if runtime.is_none() {
            self.inner.flush();
        }
    }

    fn remove_pending(&self, mut matches: impl FnMut(&PrioritizedItem<I>) -> bool) -> bool {
        let mut batch = self.inner.batch.lock();
        let before = batch.pending.len();
        batch.pending.retain(|entry| !matches(entry));
        batch.pending.len() != before
    }
}

async fn untrack_on_completion<I>(
    menu: Weak<MenuInner<I>>,
    extractor: GeneratorStreamExtractor<Arc<I>>,
) where
    I: Send + Sync + 'static,
{
    extractor.completion().await;
    if let Some(inner) = menu.upgrade() {
        inner.forget_generator(&extractor);
    }
}

impl<I> Clone for AsyncMenu<I> {
    fn clone(&self) -> Self {
        AsyncMenu {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I: Send + Sync + 'static> Default for AsyncMenu<I> {
    fn default() -> Self {
        AsyncMenu::new(MenuConfig::default())
    }
}

impl<I: fmt::Debug> fmt::Debug for AsyncMenu<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncMenu")
            .field("items", &self.inner.items.get(None))
            .field("pending", &self.inner.batch.lock().pending.len())
            .field("generators", &self.inner.generators.with(None, Vec::len))
            .finish_non_exhaustive()
    }
}
