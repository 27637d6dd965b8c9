//! Grammar definition errors and recognition errors.

use std::fmt;
use std::panic::Location;

use lm_ir::{HighlightError, HighlightErrorKind, Span};
use lm_lexer::{LexError, Token};
use thiserror::Error;

/// A problem found while analysing a grammar.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DefinitionIssue {
    #[error("grammar defines no rules")]
    NoRules,

    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),

    #[error("start rule `{0}` is not defined")]
    UnknownStartRule(String),

    #[error("rule `{rule}` invokes undefined rule `{reference}`")]
    UnresolvedRule { rule: String, reference: String },

    #[error("rule `{rule}` has an alternation without alternatives at {location}")]
    EmptyAlternation {
        rule: String,
        location: &'static Location<'static>,
    },

    #[error(
        "decision point at {location} is reached more than once while recording rule \
         `{rule}`; mark the helper that contains it #[track_caller]"
    )]
    SharedDecisionPoint {
        rule: String,
        location: &'static Location<'static>,
    },

    #[error("left recursion: {}", .path.join(" -> "))]
    LeftRecursion { rule: String, path: Vec<String> },

    #[error(
        "alternatives {first} and {second} of the alternation at {location} in rule `{rule}` \
         share the lookahead path <{}>",
        .path.join(" ")
    )]
    AmbiguousAlternatives {
        rule: String,
        location: &'static Location<'static>,
        first: usize,
        second: usize,
        path: Vec<String>,
    },
}

/// Returned by self-analysis when a grammar cannot be used.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid grammar: {}", join_issues(.issues))]
pub struct GrammarError {
    pub issues: Vec<DefinitionIssue>,
}

impl GrammarError {
    pub fn issues(&self) -> &[DefinitionIssue] {
        &self.issues
    }
}

fn join_issues(issues: &[DefinitionIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unwinds a rule invocation after a recognition error was recorded.
///
/// Rules never construct this; they propagate it with `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognitionAbort(pub(crate) ());

/// Result of a rule or recognizer primitive.
pub type ParseResult<R> = Result<R, RecognitionAbort>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecognitionErrorKind {
    MismatchedToken,
    NoViableAlternative,
    /// A one-or-more repetition could not match its first iteration.
    EarlyExit,
    /// The start rule finished before the last token.
    NotAllInputParsed,
}

impl RecognitionErrorKind {
    pub fn highlight_kind(self) -> HighlightErrorKind {
        match self {
            RecognitionErrorKind::MismatchedToken => HighlightErrorKind::MismatchedToken,
            RecognitionErrorKind::NoViableAlternative => HighlightErrorKind::NoViableAlternative,
            RecognitionErrorKind::EarlyExit => HighlightErrorKind::EarlyExit,
            RecognitionErrorKind::NotAllInputParsed => HighlightErrorKind::NotAllInputParsed,
        }
    }
}

/// A grammar error at a specific token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognitionError {
    pub kind: RecognitionErrorKind,
    pub message: String,
    /// The offending token; `kind.is_eof()` at the end of input.
    pub token: Token,
    /// Rules being recognized when the error occurred, outermost first.
    pub rule_stack: Vec<String>,
}

impl RecognitionError {
    /// Range of the error in a text of `text_len` bytes.
    ///
    /// The offending token's range, or the empty range at the end of the
    /// text when input ran out.
    pub fn span(&self, text_len: usize) -> Span {
        if self.token.kind.is_eof() {
            Span::empty_at(text_len)
        } else {
            self.token.span()
        }
    }

    pub fn to_highlight_error(&self, source: &str) -> HighlightError {
        HighlightError::new(
            self.kind.highlight_kind(),
            self.message.clone(),
            source,
            self.span(source.len()),
        )
    }
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RecognitionError {}

/// Any error reported by an execution, lexical or grammatical.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Lexical(#[from] LexError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}

impl ExecutionError {
    pub fn to_highlight_error(&self, source: &str) -> HighlightError {
        match self {
            ExecutionError::Lexical(err) => err.to_highlight_error(source),
            ExecutionError::Recognition(err) => err.to_highlight_error(source),
        }
    }

    pub fn is_lexical(&self) -> bool {
        matches!(self, ExecutionError::Lexical(_))
    }
}
