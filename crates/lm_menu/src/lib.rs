//! Priority-ordered menus populated by pausable async generators.
//!
//! [`AsyncMenu`] keeps [`PrioritizedItem`]s sorted, batches bursts of
//! inserts behind a debounce timer, and tracks the generators still feeding
//! it. Each generator is driven by a [`GeneratorStreamExtractor`], which can
//! pause a producer at its next emitted item and stop it cooperatively.
//!
//! Starting generators and batch timers use the ambient tokio runtime.

mod config;
mod extractor;
mod item;
mod menu;

pub use config::{MenuConfig, SortOrder};
pub use extractor::{Emitter, ExtractError, GeneratorStreamExtractor, Phase};
pub use item::PrioritizedItem;
pub use menu::{AsyncMenu, ItemGenerator, MenuSource, DEFAULT_PRIORITY, PRIORITY_STEP};
