//! Shared value types for the highlighting engine.
//!
//! Everything a renderer needs to know about highlighted text lives here:
//! - [`Span`]: half-open byte range into the highlighted text
//! - [`HighlightNode`]: a tagged span of text
//! - [`HighlightError`]: a lexical or grammatical problem with its range
//! - [`Highlighter`]: the single interface between the engine and a text field
//!
//! This crate has no dependency on the lexer or parser, so renderers can
//! consume highlight results without pulling in the engine.

mod highlight;
mod span;

pub use highlight::{Highlight, HighlightError, HighlightErrorKind, HighlightNode, Highlighter, TagList};
pub use span::{Span, SyntaxRange};
