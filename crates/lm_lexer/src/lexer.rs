//! The highlight lexer.

use std::sync::Arc;

use lm_ir::{Highlight, Highlighter};
use tracing::{debug, trace};

use crate::{LexError, TaggedToken, Token, TokenGroup, Vocabulary};

/// Parser-facing output: skipped tokens are dropped.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

/// Highlight-facing output: every token, skipped ones included, with tags.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HighlightData {
    pub tokens: Vec<TaggedToken>,
    pub errors: Vec<LexError>,
}

/// Tokenizes text against a shared [`Vocabulary`].
///
/// The lexer holds no per-call state; one instance may serve any number of
/// texts, from any number of threads.
#[derive(Clone, Debug)]
pub struct HighlightLexer {
    vocabulary: Arc<Vocabulary>,
}

impl HighlightLexer {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        HighlightLexer { vocabulary }
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// Tokenize `text` for parsing.
    pub fn tokenize(&self, text: &str) -> Tokenized {
        let mut tokens = Vec::new();
        let errors = self.scan(text, |token, group| {
            if group == TokenGroup::Normal {
                tokens.push(token);
            }
        });
        Tokenized { tokens, errors }
    }

    /// Tokenize `text` for highlighting.
    pub fn highlight_data(&self, text: &str) -> HighlightData {
        let mut tokens = Vec::new();
        let errors = self.scan(text, |token, group| {
            let tags = self
                .vocabulary
                .token_type(token.kind)
                .map(|ty| ty.tags().clone())
                .unwrap_or_default();
            tokens.push(TaggedToken {
                token,
                tags,
                skipped: group == TokenGroup::Skipped,
            });
        });
        HighlightData { tokens, errors }
    }

    /// Walk `text`, handing each token to `emit` and collecting one error per
    /// run of unmatched characters.
    #[tracing::instrument(level = "trace", skip_all, fields(len = text.len()))]
    fn scan(&self, text: &str, mut emit: impl FnMut(Token, TokenGroup)) -> Vec<LexError> {
        let mut errors = Vec::new();
        let mut error_start: Option<usize> = None;
        let mut pos = 0;
        let mut horizons = self.vocabulary.fresh_horizons();

        while pos < text.len() {
            let rest = &text[pos..];
            let matched = self.vocabulary.match_at(text, pos, &mut horizons);
            if let Some((ty, len)) = matched {
                if let Some(start) = error_start.take() {
                    errors.push(LexError::unmatched(text, start, pos));
                }
                trace!(kind = ty.name(), start = pos, len, "token");
                emit(
                    Token {
                        kind: ty.kind(),
                        image: rest[..len].to_owned(),
                        start_offset: pos,
                        end_offset: pos + len - 1,
                    },
                    ty.group(),
                );
                pos += len;
            } else {
                error_start.get_or_insert(pos);
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
        if let Some(start) = error_start {
            errors.push(LexError::unmatched(text, start, text.len()));
        }
        if !errors.is_empty() {
            debug!(count = errors.len(), "lexical errors");
        }
        errors
    }
}

impl Highlighter for HighlightLexer {
    /// Lexical highlighting only: one node per token, one error per
    /// unmatched run.
    fn highlight(&self, text: &str) -> Highlight {
        let data = self.highlight_data(text);
        Highlight {
            nodes: data.tokens.into_iter().map(TaggedToken::into_node).collect(),
            errors: data
                .errors
                .iter()
                .map(|err| err.to_highlight_error(text))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests;
