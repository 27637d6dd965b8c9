//! The recognizer: parsing primitives handed to rule bodies.
//!
//! The same type serves two modes. While recording (during self-analysis)
//! the primitives describe the grammar instead of reading input. While
//! parsing, `or`/`many`/`option`/`at_least_one` predict with the LL(k)
//! tables computed from that recording.

use std::fmt;
use std::panic::Location;

use lm_lexer::{Token, TokenKind, Vocabulary};
use tracing::{trace, warn};

use crate::analysis::{DecisionTable, Lookahead, Path};
use crate::gast::{DecisionKey, DecisionKind, Gast, Production, Recorder};
use crate::grammar::{RuleId, RuleTable};
use crate::stack::ensure_sufficient_stack;
use crate::{
    DefinitionIssue, ParseResult, RecognitionAbort, RecognitionError, RecognitionErrorKind,
};

/// One alternative of [`Recognizer::or`].
pub type Alternative<'a, S, R> = &'a mut dyn FnMut(&mut S) -> ParseResult<R>;

/// Parsing context passed to every rule body.
pub struct Recognizer<'p, T> {
    rules: &'p RuleTable<T>,
    vocabulary: &'p Vocabulary,
    /// `None` while recording.
    lookahead: Option<&'p Lookahead>,
    recorder: Option<Recorder>,
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
    errors: Vec<RecognitionError>,
    rule_stack: Vec<RuleId>,
    recovery: bool,
    /// Depth of speculative attempts; errors inside them are rolled back.
    speculating: usize,
}

impl<'p, T: Default> Recognizer<'p, T> {
    /// Record every rule of `rules` into a grammar AST.
    pub(crate) fn record(
        rules: &'p RuleTable<T>,
        vocabulary: &'p Vocabulary,
    ) -> (Gast, Vec<DefinitionIssue>) {
        let mut recognizer = Recognizer {
            rules,
            vocabulary,
            lookahead: None,
            recorder: Some(Recorder::default()),
            tokens: Vec::new(),
            pos: 0,
            eof: Token::default(),
            errors: Vec::new(),
            rule_stack: Vec::new(),
            recovery: false,
            speculating: 0,
        };
        for id in rules.ids() {
            if let Some(recorder) = &mut recognizer.recorder {
                recorder.begin_rule(rules.name(id));
            }
            recognizer.rule_stack.push(id);
            let body = &rules.get(id).body;
            // Primitives never fail while recording.
            let _ = body(&mut recognizer);
            recognizer.rule_stack.pop();
            if let Some(recorder) = &mut recognizer.recorder {
                recorder.end_rule();
            }
        }
        recognizer
            .recorder
            .map(Recorder::finish)
            .unwrap_or_default()
    }

    /// A recognizer reading `tokens` from a text of `text_len` bytes.
    pub(crate) fn parsing(
        rules: &'p RuleTable<T>,
        vocabulary: &'p Vocabulary,
        lookahead: &'p Lookahead,
        tokens: Vec<Token>,
        text_len: usize,
        recovery: bool,
    ) -> Self {
        Recognizer {
            rules,
            vocabulary,
            lookahead: Some(lookahead),
            recorder: None,
            tokens,
            pos: 0,
            eof: Token {
                kind: TokenKind::EOF,
                image: String::new(),
                start_offset: text_len,
                end_offset: text_len,
            },
            errors: Vec::new(),
            rule_stack: Vec::new(),
            recovery,
            speculating: 0,
        }
    }

    /// Run `rule`, then report any tokens it left unconsumed.
    pub(crate) fn run(&mut self, rule: RuleId) -> ParseResult<T> {
        let value = self.invoke(rule)?;
        if self.pos < self.tokens.len() {
            let found = describe(self.la(1));
            self.fail(
                RecognitionErrorKind::NotAllInputParsed,
                format!("expected end of input but found {found}"),
            );
        }
        Ok(value)
    }

    pub(crate) fn into_errors(self) -> Vec<RecognitionError> {
        self.errors
    }

    /// Check if the recognizer is recording the grammar rather than
    /// reading input.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Consume the next token if it is of type `kind` or a member of the
    /// category `kind`.
    pub fn consume(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if let Some(recorder) = &mut self.recorder {
            recorder.push(Production::Terminal(kind));
            return Ok(Token {
                kind,
                ..Token::default()
            });
        }

        if self.vocabulary.matches(self.la(1).kind, kind) {
            let token = self.la(1).clone();
            self.pos += 1;
            return Ok(token);
        }

        if self.recovery
            && self.speculating == 0
            && self.vocabulary.matches(self.la(2).kind, kind)
        {
            let message = format!("unexpected {}", describe(self.la(1)));
            self.fail(RecognitionErrorKind::MismatchedToken, message);
            trace!(skipped = %self.la(1).image, "single token deletion");
            self.pos += 1;
            let token = self.la(1).clone();
            self.pos += 1;
            return Ok(token);
        }

        let message = format!(
            "expected {} but found {}",
            self.vocabulary.name(kind),
            describe(self.la(1))
        );
        Err(self.fail(RecognitionErrorKind::MismatchedToken, message))
    }

    /// Invoke the rule registered as `name` and return its value.
    pub fn subrule(&mut self, name: &str) -> ParseResult<T> {
        let Some(id) = self.rules.id(name) else {
            if let Some(recorder) = &mut self.recorder {
                recorder.unresolved(name);
                return Ok(T::default());
            }
            warn!(rule = name, "invocation of an undefined rule");
            return Err(self.fail(
                RecognitionErrorKind::NoViableAlternative,
                format!("rule `{name}` is not defined"),
            ));
        };
        if let Some(recorder) = &mut self.recorder {
            recorder.push(Production::NonTerminal(id));
            return Ok(T::default());
        }
        self.invoke(id)
    }

    /// Run `body` when the lookahead can start it.
    #[track_caller]
    pub fn option<R>(
        &mut self,
        body: impl FnOnce(&mut Self) -> ParseResult<R>,
    ) -> ParseResult<Option<R>> {
        let location = Location::caller();
        if self.is_recording() {
            let seq = self.record_sequence(|r| {
                let _ = body(r);
            });
            self.record_decision(location, DecisionKind::Option, vec![seq]);
            return Ok(None);
        }
        match self.predict_entry(location) {
            Some(true) => body(self).map(Some),
            Some(false) => Ok(None),
            None => Ok(self.speculate(body)),
        }
    }

    /// Run `body` zero or more times, while the lookahead can start it.
    #[track_caller]
    pub fn many(&mut self, mut body: impl FnMut(&mut Self) -> ParseResult<()>) -> ParseResult<()> {
        let location = Location::caller();
        if self.is_recording() {
            let seq = self.record_sequence(|r| {
                let _ = body(r);
            });
            self.record_decision(location, DecisionKind::Many, vec![seq]);
            return Ok(());
        }
        self.repeat(location, &mut body)
    }

    /// Run `body` one or more times. Fails with an early exit error when
    /// the first iteration cannot start.
    #[track_caller]
    pub fn at_least_one(
        &mut self,
        mut body: impl FnMut(&mut Self) -> ParseResult<()>,
    ) -> ParseResult<()> {
        let location = Location::caller();
        if self.is_recording() {
            let seq = self.record_sequence(|r| {
                let _ = body(r);
            });
            self.record_decision(location, DecisionKind::AtLeastOne, vec![seq]);
            return Ok(());
        }
        if let Some(table) = self.table(location) {
            if !self.enters(table) {
                let message = format!(
                    "expected at least one iteration starting with {} but found {}",
                    self.expected(table),
                    describe(self.la(1))
                );
                return Err(self.fail(RecognitionErrorKind::EarlyExit, message));
            }
        }
        body(self)?;
        self.repeat(location, &mut body)
    }

    /// Run the alternative whose lookahead path matches the input.
    ///
    /// The longest matching path wins; among equally long paths the first
    /// alternative does.
    #[track_caller]
    pub fn or<R: Default>(&mut self, alternatives: &mut [Alternative<'_, Self, R>]) -> ParseResult<R> {
        let location = Location::caller();
        if self.is_recording() {
            let mut recorded = Vec::with_capacity(alternatives.len());
            for alternative in alternatives.iter_mut() {
                recorded.push(self.record_sequence(|r| {
                    let _ = alternative(r);
                }));
            }
            self.record_decision(location, DecisionKind::Alternation, recorded);
            return Ok(R::default());
        }

        let Some(table) = self.table(location) else {
            for alternative in alternatives.iter_mut() {
                if let Some(value) = self.speculate(|r| alternative(r)) {
                    return Ok(value);
                }
            }
            let message = format!("no alternative matches {}", describe(self.la(1)));
            return Err(self.fail(RecognitionErrorKind::NoViableAlternative, message));
        };

        match self.predict_alternative(&table.alternatives) {
            Some(index) if index < alternatives.len() => alternatives[index](self),
            _ => {
                let message = format!(
                    "expected {} but found {}",
                    self.expected(table),
                    describe(self.la(1))
                );
                Err(self.fail(RecognitionErrorKind::NoViableAlternative, message))
            }
        }
    }

    /// Run a semantic action. Skipped while recording.
    pub fn action(&mut self, f: impl FnOnce()) {
        if !self.is_recording() {
            f();
        }
    }

    fn invoke(&mut self, id: RuleId) -> ParseResult<T> {
        let rules = self.rules;
        let rule = rules.get(id);
        trace!(rule = %rule.name, pos = self.pos, "enter rule");
        self.rule_stack.push(id);
        let result = ensure_sufficient_stack(|| (rule.body)(self));
        self.rule_stack.pop();
        result
    }

    fn repeat(
        &mut self,
        location: &'static Location<'static>,
        body: &mut impl FnMut(&mut Self) -> ParseResult<()>,
    ) -> ParseResult<()> {
        loop {
            let start = self.pos;
            match self.predict_entry(location) {
                Some(true) => body(self)?,
                Some(false) => break,
                None => {
                    if self.speculate(&mut *body).is_none() {
                        break;
                    }
                }
            }
            if self.pos == start {
                break;
            }
        }
        Ok(())
    }

    /// Run `f`, rolling back position and errors if it fails.
    fn speculate<R>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<R>) -> Option<R> {
        let (pos, errors) = (self.pos, self.errors.len());
        self.speculating += 1;
        let result = f(self);
        self.speculating -= 1;
        match result {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = pos;
                self.errors.truncate(errors);
                None
            }
        }
    }

    fn record_sequence(&mut self, f: impl FnOnce(&mut Self)) -> Vec<Production> {
        if let Some(recorder) = &mut self.recorder {
            recorder.open();
        }
        f(self);
        self.recorder
            .as_mut()
            .map(Recorder::close)
            .unwrap_or_default()
    }

    fn record_decision(
        &mut self,
        location: &'static Location<'static>,
        kind: DecisionKind,
        alternatives: Vec<Vec<Production>>,
    ) {
        let key = self.key(location);
        if let Some(recorder) = &mut self.recorder {
            recorder.decision(key, kind, alternatives);
        }
    }
}

impl<'p, T> Recognizer<'p, T> {
    /// The `k`-th token ahead (1-based; 0 is treated as 1), or the end of
    /// input token past the last one.
    pub fn la(&self, k: usize) -> &Token {
        self.tokens
            .get(self.pos + k.saturating_sub(1))
            .unwrap_or(&self.eof)
    }

    fn key(&self, location: &'static Location<'static>) -> DecisionKey {
        let rule = self
            .rule_stack
            .last()
            .copied()
            .unwrap_or(RuleId::from_index(0));
        (rule, location)
    }

    /// Lookahead table of the decision at `location`; `None` for call
    /// sites the recording never reached.
    fn table(&self, location: &'static Location<'static>) -> Option<&'p DecisionTable> {
        let lookahead = self.lookahead?;
        lookahead.get(&self.key(location))
    }

    fn predict_entry(&self, location: &'static Location<'static>) -> Option<bool> {
        self.table(location).map(|table| self.enters(table))
    }

    fn enters(&self, table: &DecisionTable) -> bool {
        self.predict_alternative(&table.alternatives) == Some(0)
    }

    /// Pick the alternative to run.
    ///
    /// The longest fully matching non-empty path wins. Without one, the
    /// path matching the most leading tokens wins, so the body runs and
    /// reports the error at the token that actually diverges. An empty
    /// path is the last resort. Ties go to the first alternative.
    fn predict_alternative(&self, alternatives: &[Vec<Path>]) -> Option<usize> {
        let mut full: Option<(usize, usize)> = None;
        let mut partial: Option<(usize, usize)> = None;
        let mut empty = None;
        for (index, paths) in alternatives.iter().enumerate() {
            for path in paths {
                let depth = self.matched_prefix(path);
                if path.is_empty() {
                    empty = empty.or(Some(index));
                } else if depth == path.len() {
                    if !full.is_some_and(|(_, len)| depth <= len) {
                        full = Some((index, depth));
                    }
                } else if depth > 0 && !partial.is_some_and(|(_, len)| depth <= len) {
                    partial = Some((index, depth));
                }
            }
        }
        full.or(partial).map(|(index, _)| index).or(empty)
    }

    /// Number of leading input tokens that match `path`.
    fn matched_prefix(&self, path: &[TokenKind]) -> usize {
        path.iter()
            .enumerate()
            .take_while(|&(offset, &kind)| self.vocabulary.matches(self.la(offset + 1).kind, kind))
            .count()
    }

    /// Names of the tokens that can start the decision's alternatives.
    fn expected(&self, table: &DecisionTable) -> String {
        let mut names: Vec<&str> = Vec::new();
        for path in table.alternatives.iter().flatten() {
            if let Some(&kind) = path.first() {
                let name = self.vocabulary.name(kind);
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        match names.split_last() {
            None => String::from("nothing"),
            Some((last, [])) => (*last).to_owned(),
            Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
        }
    }

    /// Record an error at the next token.
    fn fail(&mut self, kind: RecognitionErrorKind, message: String) -> RecognitionAbort {
        let rule_stack = self
            .rule_stack
            .iter()
            .map(|&id| self.rules.name(id).to_owned())
            .collect();
        let error = RecognitionError {
            kind,
            message,
            token: self.la(1).clone(),
            rule_stack,
        };
        trace!(%error, speculating = self.speculating, "recognition error");
        self.errors.push(error);
        RecognitionAbort(())
    }
}

impl<T> fmt::Debug for Recognizer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recognizer")
            .field("recording", &self.recorder.is_some())
            .field("pos", &self.pos)
            .field("tokens", &self.tokens.len())
            .field("errors", &self.errors.len())
            .finish_non_exhaustive()
    }
}

fn describe(token: &Token) -> String {
    if token.kind.is_eof() {
        String::from("end of input")
    } else {
        format!("`{}`", token.image)
    }
}
