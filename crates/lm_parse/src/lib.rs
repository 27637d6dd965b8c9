//! Highlight parser.
//!
//! Grammars are written as named rule closures over a [`Recognizer`]:
//!
//! - `consume(kind)` matches one token (or any member of a category)
//! - `subrule(name)` invokes another rule and returns its value
//! - `or`, `many`, `at_least_one` and `option` are decision points
//! - `action(f)` runs semantic code that must only see real input
//!
//! [`GrammarBuilder::perform_self_analysis`] runs every rule once in
//! recording mode to build a grammar AST, rejects left recursion and
//! ambiguous alternatives, and computes LL(k) lookahead tables for every
//! decision point. The resulting [`HighlightParser`] never backtracks on
//! recorded decisions; call sites the recording did not reach (rule code
//! that branches on token values) fall back to speculative parsing.

mod analysis;
mod config;
mod error;
mod gast;
mod grammar;
mod parser;
mod recognizer;
mod stack;

pub use config::ParserConfig;
pub use error::{
    DefinitionIssue, ExecutionError, GrammarError, ParseResult, RecognitionAbort,
    RecognitionError, RecognitionErrorKind,
};
pub use grammar::{GrammarBuilder, RuleId};
pub use parser::{Execution, HighlightParser};
pub use recognizer::{Alternative, Recognizer};
