//! Highlight lexer.
//!
//! A [`Vocabulary`] is an ordered list of token types, each a regex pattern
//! with highlight tags. The [`HighlightLexer`] tokenizes text against it:
//!
//! - at every offset the first declared type whose pattern matches wins
//! - skipped types (whitespace, comments) are hidden from the parser but
//!   kept for highlighting
//! - characters no pattern matches are skipped and reported as one
//!   [`LexError`] per contiguous run, so lexing always reaches the end
//!
//! Offsets are byte offsets. Raw token ranges are inclusive
//! (`[start_offset, end_offset]`); highlight nodes are half-open.

mod lex_error;
mod lexer;
mod token;
mod vocabulary;

pub use lex_error::LexError;
pub use lexer::{HighlightData, HighlightLexer, Tokenized};
pub use token::{TaggedToken, Token};
pub use vocabulary::{
    TokenDef, TokenGroup, TokenKind, TokenType, Vocabulary, VocabularyBuilder, VocabularyError,
};
