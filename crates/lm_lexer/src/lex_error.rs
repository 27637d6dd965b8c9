//! Lexical errors.

use std::fmt;

use lm_ir::{HighlightError, HighlightErrorKind, Span};

/// A run of characters that no token pattern matches.
///
/// The lexer skips the run and carries on, so every error is local: text
/// on either side of it is still tokenized.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LexError {
    /// Byte offset of the first unmatched character.
    pub offset: usize,
    /// Length of the unmatched run in bytes.
    pub length: usize,
    /// 1-based line of `offset`.
    pub line: usize,
    /// 1-based column (in characters) of `offset`.
    pub column: usize,
    pub message: String,
}

impl LexError {
    /// Describe the unmatched run `text[start..end]`.
    pub(crate) fn unmatched(text: &str, start: usize, end: usize) -> Self {
        let before = &text[..start];
        let line_start = before.rfind('\n').map_or(0, |newline| newline + 1);
        let line = before.matches('\n').count() + 1;
        let column = before[line_start..].chars().count() + 1;
        let skipped = &text[start..end];
        LexError {
            offset: start,
            length: end - start,
            line,
            column,
            message: format!(
                "unexpected character{} `{}` at line {}, column {}",
                if skipped.chars().nth(1).is_some() { "s" } else { "" },
                skipped.escape_debug(),
                line,
                column
            ),
        }
    }

    #[inline]
    pub const fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.length)
    }

    /// Convert into the renderer-facing error format.
    pub fn to_highlight_error(&self, source: &str) -> HighlightError {
        HighlightError::new(
            HighlightErrorKind::Lexical,
            self.message.clone(),
            source,
            self.span(),
        )
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LexError {}
