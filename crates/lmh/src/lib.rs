//! Library half of the `lmh` binary: the demo calculator grammar and the
//! command handlers, kept here so they can be tested.

pub mod calc;
pub mod commands;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the global tracing subscriber.
///
/// Nothing is installed unless `RUST_LOG` is set. With `LMH_LOG_TREE` set
/// as well, spans are rendered as an indented tree instead of flat lines.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let tree = std::env::var_os("LMH_LOG_TREE").is_some();
        let tree_layer = tree.then(|| {
            tracing_tree::HierarchicalLayer::new(2)
                .with_writer(std::io::stderr)
                .with_targets(true)
                .with_bracketed_fields(true)
        });
        let flat_layer = (!tree).then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
        });
        tracing_subscriber::registry()
            .with(tree_layer)
            .with(flat_layer)
            .with(filter)
            .init();
    });
}
