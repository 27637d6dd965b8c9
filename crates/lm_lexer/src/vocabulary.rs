//! Token vocabularies.
//!
//! A vocabulary is built once, validated as each type is defined, and then
//! shared (read-only) by the lexer and any parser layered on it.
//!
//! ```text
//! let mut vocab = Vocabulary::builder();
//! let add_op = vocab.define(TokenDef::category("AdditionOperator"))?;
//! let plus = vocab.define(TokenDef::new("Plus", r"\+").tags(["operator"]).member_of(add_op))?;
//! let ws = vocab.define(TokenDef::new("Whitespace", r"\s+").skipped())?;
//! let vocabulary = vocab.build();
//! ```

use std::fmt;

use lm_ir::TagList;
use regex::Regex;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Handle to a token type of one vocabulary.
///
/// Kinds are dense indices in declaration order. [`TokenKind::EOF`] is the
/// virtual kind of the end-of-input token the parser appends.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TokenKind(u16);

impl TokenKind {
    /// End of input.
    pub const EOF: TokenKind = TokenKind(u16::MAX);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_eof(self) -> bool {
        self.0 == u16::MAX
    }
}

impl Default for TokenKind {
    fn default() -> Self {
        TokenKind::EOF
    }
}

impl fmt::Debug for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            f.write_str("TokenKind(EOF)")
        } else {
            write!(f, "TokenKind({})", self.0)
        }
    }
}

/// Whether a token type's tokens reach the parser.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum TokenGroup {
    #[default]
    Normal,
    /// Highlighted, but hidden from the parser (whitespace, comments).
    Skipped,
}

/// Definition of a token type, consumed by [`VocabularyBuilder::define`].
#[derive(Clone, Debug)]
pub struct TokenDef {
    name: String,
    pattern: Option<String>,
    tags: Vec<String>,
    group: TokenGroup,
    categories: Vec<TokenKind>,
}

impl TokenDef {
    /// A concrete token type matched by `pattern`.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        TokenDef {
            name: name.into(),
            pattern: Some(pattern.into()),
            tags: Vec::new(),
            group: TokenGroup::Normal,
            categories: Vec::new(),
        }
    }

    /// An abstract category: never matched itself, but a grammar consuming
    /// it accepts any of its member types.
    pub fn category(name: impl Into<String>) -> Self {
        TokenDef {
            name: name.into(),
            pattern: None,
            tags: Vec::new(),
            group: TokenGroup::Normal,
            categories: Vec::new(),
        }
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn skipped(mut self) -> Self {
        self.group = TokenGroup::Skipped;
        self
    }

    #[must_use]
    pub fn member_of(mut self, category: TokenKind) -> Self {
        self.categories.push(category);
        self
    }
}

/// Errors detected while defining a vocabulary.
#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("token type `{0}` is defined more than once")]
    DuplicateName(String),

    #[error("token type `{name}` has an invalid pattern")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern `{pattern}` of token type `{name}` can match the empty string")]
    EmptyMatch { name: String, pattern: String },

    #[error("token type `{name}` lists `{category}` as its category, but it is not a category")]
    NotACategory { name: String, category: String },

    #[error("token type `{name}` lists an unknown category")]
    UnknownCategory { name: String },

    #[error("a vocabulary holds at most {max} token types")]
    TooManyTypes { max: usize },
}

/// A validated token type.
#[derive(Debug)]
pub struct TokenType {
    kind: TokenKind,
    name: String,
    /// `None` for categories.
    pattern: Option<Regex>,
    tags: TagList,
    group: TokenGroup,
    categories: Vec<TokenKind>,
}

impl TokenType {
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &TagList {
        &self.tags
    }

    pub fn group(&self) -> TokenGroup {
        self.group
    }

    pub fn is_category(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn categories(&self) -> &[TokenKind] {
        &self.categories
    }

    /// Leftmost match at or after `pos`, searched within the whole of
    /// `text` so look-around assertions see the preceding characters.
    fn find_from(&self, text: &str, pos: usize) -> Option<(usize, usize)> {
        self.pattern
            .as_ref()?
            .find_at(text, pos)
            .map(|m| (m.start(), m.end()))
    }
}

/// Incrementally defines the token types of a [`Vocabulary`].
#[derive(Debug, Default)]
pub struct VocabularyBuilder {
    types: Vec<TokenType>,
    by_name: FxHashMap<String, TokenKind>,
}

impl VocabularyBuilder {
    /// Validate and add a token type, returning its kind.
    ///
    /// Types are tried in definition order when lexing.
    pub fn define(&mut self, def: TokenDef) -> Result<TokenKind, VocabularyError> {
        if self.by_name.contains_key(&def.name) {
            return Err(VocabularyError::DuplicateName(def.name));
        }
        let index = u16::try_from(self.types.len())
            .ok()
            .filter(|&index| index < u16::MAX)
            .ok_or(VocabularyError::TooManyTypes {
                max: usize::from(u16::MAX),
            })?;

        for category in &def.categories {
            match self.types.get(category.index()) {
                Some(ty) if ty.is_category() => {}
                Some(ty) => {
                    return Err(VocabularyError::NotACategory {
                        name: def.name,
                        category: ty.name.clone(),
                    })
                }
                None => return Err(VocabularyError::UnknownCategory { name: def.name }),
            }
        }

        let pattern = match &def.pattern {
            Some(source) => {
                let compiled = Regex::new(source).map_err(|source| {
                    VocabularyError::InvalidPattern {
                        name: def.name.clone(),
                        source,
                    }
                })?;
                if compiled.is_match("") {
                    return Err(VocabularyError::EmptyMatch {
                        name: def.name,
                        pattern: source.clone(),
                    });
                }
                Some(compiled)
            }
            None => None,
        };

        let kind = TokenKind(index);
        self.by_name.insert(def.name.clone(), kind);
        self.types.push(TokenType {
            kind,
            name: def.name,
            pattern,
            tags: TagList::new(def.tags),
            group: def.group,
            categories: def.categories,
        });
        Ok(kind)
    }

    pub fn build(self) -> Vocabulary {
        let matchable = self
            .types
            .iter()
            .filter(|ty| !ty.is_category())
            .map(|ty| ty.kind)
            .collect();
        Vocabulary {
            types: self.types,
            by_name: self.by_name,
            matchable,
        }
    }
}

/// An ordered, validated set of token types.
#[derive(Debug)]
pub struct Vocabulary {
    types: Vec<TokenType>,
    by_name: FxHashMap<String, TokenKind>,
    /// Concrete (non-category) types in declaration order.
    matchable: Vec<TokenKind>,
}

impl Vocabulary {
    pub fn builder() -> VocabularyBuilder {
        VocabularyBuilder::default()
    }

    /// Look up a kind by type name.
    pub fn kind(&self, name: &str) -> Option<TokenKind> {
        self.by_name.get(name).copied()
    }

    pub fn token_type(&self, kind: TokenKind) -> Option<&TokenType> {
        self.types.get(kind.index())
    }

    /// Display name of `kind`; `EOF` for the end-of-input kind.
    pub fn name(&self, kind: TokenKind) -> &str {
        self.token_type(kind).map_or("EOF", TokenType::name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenType> {
        self.types.iter()
    }

    /// Check if a token of kind `actual` satisfies an `expected` kind,
    /// either directly or through one of its categories.
    pub fn matches(&self, actual: TokenKind, expected: TokenKind) -> bool {
        actual == expected
            || self
                .token_type(actual)
                .is_some_and(|ty| ty.categories.contains(&expected))
    }

    /// Check if some token could satisfy both `a` and `b`.
    pub fn overlaps(&self, a: TokenKind, b: TokenKind) -> bool {
        if a == b {
            return true;
        }
        self.matchable
            .iter()
            .any(|&concrete| self.matches(concrete, a) && self.matches(concrete, b))
    }

    /// First concrete type with a non-empty match starting exactly at `pos`,
    /// with the match length.
    ///
    /// `horizons` holds, per matchable type, the earliest offset a match can
    /// start at given earlier searches; callers scan forward and reuse it
    /// across calls (start it from [`Vocabulary::fresh_horizons`]).
    pub(crate) fn match_at(
        &self,
        text: &str,
        pos: usize,
        horizons: &mut [usize],
    ) -> Option<(&TokenType, usize)> {
        for (kind, horizon) in self.matchable.iter().zip(horizons.iter_mut()) {
            if pos < *horizon {
                continue;
            }
            let ty = &self.types[kind.index()];
            match ty.find_from(text, pos) {
                Some((start, end)) if start == pos => {
                    if end > start {
                        return Some((ty, end - start));
                    }
                }
                Some((start, _)) => *horizon = start,
                None => *horizon = usize::MAX,
            }
        }
        None
    }

    pub(crate) fn fresh_horizons(&self) -> Vec<usize> {
        vec![0; self.matchable.len()]
    }
}

#[cfg(test)]
mod tests;
