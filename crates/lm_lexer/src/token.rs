//! Lexed tokens.

use lm_ir::{HighlightNode, Span, TagList};

use crate::TokenKind;

/// A classified, positioned substring of the input.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct Token {
    pub kind: TokenKind,
    /// The matched text.
    pub image: String,
    /// Offset of the first byte.
    pub start_offset: usize,
    /// Offset of the last byte (inclusive).
    pub end_offset: usize,
}

impl Token {
    /// Half-open span of the token.
    #[inline]
    pub const fn span(&self) -> Span {
        Span::from_inclusive(self.start_offset, self.end_offset)
    }
}

/// A token together with the highlight tags of its type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaggedToken {
    pub token: Token,
    pub tags: TagList,
    /// Whether the token's type is hidden from the parser.
    pub skipped: bool,
}

impl TaggedToken {
    /// Convert into a half-open highlight node.
    pub fn into_node(self) -> HighlightNode {
        let span = self.token.span();
        HighlightNode {
            text: self.token.image,
            start: span.start,
            end: span.end,
            tags: self.tags,
        }
    }
}
