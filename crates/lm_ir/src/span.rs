//! Source location spans.
//!
//! Offsets are byte offsets into the UTF-8 text handed to the lexer.

use std::fmt;
use std::ops::Range;

/// Half-open byte range `[start, end)` into highlighted text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Empty span at offset zero.
    pub const EMPTY: Span = Span { start: 0, end: 0 };

    /// Create a new span.
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Zero-length span positioned at `offset`.
    ///
    /// Used for unexpected end of input, which has no offending text.
    #[inline]
    pub const fn empty_at(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Convert an inclusive `[start, last]` token range into a half-open span.
    #[inline]
    pub const fn from_inclusive(start: usize, last: usize) -> Self {
        Span {
            start,
            end: last + 1,
        }
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span covers no text.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check if `offset` falls within the span.
    #[inline]
    pub const fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Merge two spans into the smallest span covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The text covered by this span, or `None` if it is out of bounds or
    /// does not fall on character boundaries.
    pub fn slice<'t>(&self, text: &'t str) -> Option<&'t str> {
        text.get(self.start..self.end)
    }

    /// Convert to a `Range<usize>`.
    #[inline]
    pub const fn to_range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A span together with the text it covers.
///
/// This is what error decorations render: the range to underline and the
/// snippet to quote in the message.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyntaxRange {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl SyntaxRange {
    /// Capture the range `span` of `source`.
    ///
    /// Out-of-bounds spans are clamped to the source so a stale error can
    /// never produce an invalid range.
    pub fn capture(source: &str, span: Span) -> Self {
        let end = span.end.min(source.len());
        let start = span.start.min(end);
        SyntaxRange {
            start,
            end,
            text: source.get(start..end).unwrap_or_default().to_owned(),
        }
    }

    /// The range as a [`Span`].
    #[inline]
    pub const fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}
