//! Highlight results handed to renderers.
//!
//! A [`Highlight`] pairs the tagged nodes of a text with every error found
//! in it. Nodes always cover the matchable portions of the text, even when
//! the text fails to lex or parse, so a text field can style what it can and
//! decorate the rest.

use std::fmt;
use std::sync::Arc;

use crate::{Span, SyntaxRange};

/// Semantic labels of a token type, shared by every node of that type.
///
/// Cloning is a reference-count bump; a vocabulary builds each list once.
#[derive(Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagList(Arc<[String]>);

impl TagList {
    /// Create a tag list from any iterator of tags.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagList(tags.into_iter().map(Into::into).collect())
    }

    /// Check if `tag` is one of the labels.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// The tags in declaration order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<S: Into<String>> FromIterator<S> for TagList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TagList::new(iter)
    }
}

/// A renderer-facing unit: a span of text with its tags.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighlightNode {
    pub text: String,
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    pub tags: TagList,
}

impl HighlightNode {
    #[inline]
    pub const fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Which stage reported a [`HighlightError`], and what it objected to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HighlightErrorKind {
    /// A run of characters no token pattern matches.
    Lexical,
    /// The grammar expected a different token here.
    MismatchedToken,
    /// None of the alternatives of a choice can start here.
    NoViableAlternative,
    /// A one-or-more repetition could not match even once.
    EarlyExit,
    /// The start rule finished before the input did.
    NotAllInputParsed,
}

impl HighlightErrorKind {
    /// Stable machine-readable name, used by renderers to pick a decoration.
    pub const fn as_str(self) -> &'static str {
        match self {
            HighlightErrorKind::Lexical => "lexical",
            HighlightErrorKind::MismatchedToken => "mismatched-token",
            HighlightErrorKind::NoViableAlternative => "no-viable-alternative",
            HighlightErrorKind::EarlyExit => "early-exit",
            HighlightErrorKind::NotAllInputParsed => "not-all-input-parsed",
        }
    }

    /// Check if this error came from the lexer rather than the grammar.
    pub const fn is_lexical(self) -> bool {
        matches!(self, HighlightErrorKind::Lexical)
    }
}

impl fmt::Display for HighlightErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error positioned in the highlighted text.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighlightError {
    pub message: String,
    pub kind: HighlightErrorKind,
    pub syntax_range: SyntaxRange,
}

impl HighlightError {
    /// Create an error covering `span` of `source`.
    pub fn new(
        kind: HighlightErrorKind,
        message: impl Into<String>,
        source: &str,
        span: Span,
    ) -> Self {
        HighlightError {
            message: message.into(),
            kind,
            syntax_range: SyntaxRange::capture(source, span),
        }
    }

    #[inline]
    pub const fn span(&self) -> Span {
        self.syntax_range.span()
    }
}

impl fmt::Display for HighlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error at {}: {}",
            self.kind,
            self.syntax_range.span(),
            self.message
        )
    }
}

/// Nodes and errors of one highlighted text.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Highlight {
    /// Tagged nodes in non-decreasing `start` order, non-overlapping.
    pub nodes: Vec<HighlightNode>,
    pub errors: Vec<HighlightError>,
}

impl Highlight {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Find the node covering `offset`.
    ///
    /// Binary search over the ordered, non-overlapping nodes.
    pub fn node_at(&self, offset: usize) -> Option<&HighlightNode> {
        let idx = self.nodes.partition_point(|node| node.end <= offset);
        self.nodes.get(idx).filter(|node| node.span().contains(offset))
    }

    /// Errors whose range contains `offset`, or that sit exactly at it when
    /// empty (end of input).
    pub fn errors_at(&self, offset: usize) -> impl Iterator<Item = &HighlightError> {
        self.errors.iter().filter(move |err| {
            let span = err.span();
            span.contains(offset) || (span.is_empty() && span.start == offset)
        })
    }
}

/// Anything a text field can ask to highlight its content.
///
/// This is the only boundary between the engine and the rendering layer.
pub trait Highlighter {
    fn highlight(&self, text: &str) -> Highlight;
}

impl<H: Highlighter + ?Sized> Highlighter for &H {
    fn highlight(&self, text: &str) -> Highlight {
        (**self).highlight(text)
    }
}

impl<H: Highlighter + ?Sized> Highlighter for Arc<H> {
    fn highlight(&self, text: &str) -> Highlight {
        (**self).highlight(text)
    }
}

#[cfg(test)]
mod tests;
