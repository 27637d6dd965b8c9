//! The highlight parser: a lexer plus an analysed grammar.

use std::fmt;

use lm_ir::{Highlight, Highlighter};
use lm_lexer::{HighlightLexer, TaggedToken, Token, Vocabulary};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::analysis::{self, Lookahead};
use crate::grammar::{GrammarBuilder, RuleId, RuleTable};
use crate::{
    DefinitionIssue, ExecutionError, GrammarError, ParserConfig, RecognitionError, Recognizer,
};

/// Outcome of [`HighlightParser::execute`].
#[derive(Clone, Debug, PartialEq)]
pub struct Execution<T> {
    /// Value of the start rule. Present whenever the start rule completed,
    /// even with errors (unparsed trailing input, recovered tokens).
    pub result: Option<T>,
    /// Lexical errors first, then grammar errors in the order found.
    pub errors: Vec<ExecutionError>,
}

impl<T> Execution<T> {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The result, if the text was recognized without any error.
    pub fn into_result(self) -> Result<T, Vec<ExecutionError>> {
        match self.result {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

/// A parser built by [`GrammarBuilder::perform_self_analysis`].
///
/// Immutable once built; `execute` and `highlight` may run concurrently
/// from several threads.
pub struct HighlightParser<T> {
    lexer: HighlightLexer,
    rules: RuleTable<T>,
    lookahead: Lookahead,
    start: RuleId,
    config: ParserConfig,
}

impl<T: Default> HighlightParser<T> {
    #[tracing::instrument(level = "debug", skip_all, fields(rules = builder.rules.len()))]
    pub(crate) fn analyse(
        builder: GrammarBuilder<T>,
        mut config: ParserConfig,
    ) -> Result<Self, GrammarError> {
        let GrammarBuilder { lexer, rules } = builder;
        if rules.rules.is_empty() {
            return Err(GrammarError {
                issues: vec![DefinitionIssue::NoRules],
            });
        }
        config.max_lookahead = config.max_lookahead.max(1);

        let mut issues = Vec::new();
        let mut seen = FxHashSet::default();
        for rule in &rules.rules {
            let issue = DefinitionIssue::DuplicateRule(rule.name.clone());
            if !seen.insert(rule.name.as_str()) && !issues.contains(&issue) {
                issues.push(issue);
            }
        }

        let start = match &config.start_rule {
            Some(name) => rules.id(name),
            None => Some(RuleId::from_index(0)),
        };
        if let (None, Some(name)) = (start, &config.start_rule) {
            issues.push(DefinitionIssue::UnknownStartRule(name.clone()));
        }

        let (gast, recorded) = Recognizer::record(&rules, lexer.vocabulary());
        issues.extend(recorded);

        let Some(start) = start.filter(|_| issues.is_empty()) else {
            return Err(GrammarError { issues });
        };
        let lookahead = analysis::analyse(&gast, lexer.vocabulary(), config.max_lookahead)
            .map_err(|issues| GrammarError { issues })?;

        debug!(
            decisions = lookahead.len(),
            start = rules.name(start),
            "grammar analysed"
        );
        Ok(HighlightParser {
            lexer,
            rules,
            lookahead,
            start,
            config,
        })
    }

    /// Tokenize `text` and recognize it with the start rule.
    #[tracing::instrument(level = "debug", skip_all, fields(len = text.len()))]
    pub fn execute(&self, text: &str) -> Execution<T> {
        let tokenized = self.lexer.tokenize(text);
        let (result, recognition) = self.recognize(text, tokenized.tokens);

        let mut errors: Vec<ExecutionError> = tokenized
            .errors
            .into_iter()
            .map(ExecutionError::Lexical)
            .collect();
        errors.extend(recognition.into_iter().map(ExecutionError::Recognition));
        if !errors.is_empty() {
            debug!(count = errors.len(), parsed = result.is_some(), "execution errors");
        }
        Execution { result, errors }
    }

    fn recognize(&self, text: &str, tokens: Vec<Token>) -> (Option<T>, Vec<RecognitionError>) {
        let mut recognizer = Recognizer::parsing(
            &self.rules,
            self.lexer.vocabulary(),
            &self.lookahead,
            tokens,
            text.len(),
            self.config.recovery_enabled,
        );
        let result = recognizer.run(self.start).ok();
        (result, recognizer.into_errors())
    }
}

impl<T> HighlightParser<T> {
    pub fn lexer(&self) -> &HighlightLexer {
        &self.lexer
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.lexer.vocabulary()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Name of the rule parsing starts from.
    pub fn start_rule(&self) -> &str {
        self.rules.name(self.start)
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.rules.iter().map(|rule| rule.name.as_str())
    }
}

impl<T: Default> Highlighter for HighlightParser<T> {
    /// Token nodes from the lexer, lexical errors, then the grammar errors
    /// of recognizing the same tokens.
    fn highlight(&self, text: &str) -> Highlight {
        let data = self.lexer.highlight_data(text);
        let tokens = data
            .tokens
            .iter()
            .filter(|tagged| !tagged.skipped)
            .map(|tagged| tagged.token.clone())
            .collect();
        let (_, recognition) = self.recognize(text, tokens);

        let mut errors: Vec<_> = data
            .errors
            .iter()
            .map(|err| err.to_highlight_error(text))
            .collect();
        errors.extend(recognition.iter().map(|err| err.to_highlight_error(text)));
        Highlight {
            nodes: data.tokens.into_iter().map(TaggedToken::into_node).collect(),
            errors,
        }
    }
}

impl<T> fmt::Debug for HighlightParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlightParser")
            .field("start", &self.start_rule())
            .field("rules", &self.rules.len())
            .field("decisions", &self.lookahead.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
