//! Reactive fields.
//!
//! An [`Observable`] is a value that notifies its listeners synchronously
//! after every write. Readers that want to react to changes pass a [`Hook`]
//! to the getter; the hook is subscribed the first time it reads a given
//! observable and stays subscribed until it is disposed or dropped.
//!
//! ```text
//! let hook = Hook::new(move || redraw());
//! let items = menu.get_items(Some(&hook)); // subscribes
//! // ... later writes to the menu call `redraw()` ...
//! drop(hook);                              // unsubscribes everything
//! ```
//!
//! Each observable owns its listener table; there is no global event bus.

mod hook;
mod observable;

pub use hook::Hook;
pub use observable::{Observable, Subscription};
