//! Grammar AST, recorded from rule bodies.
//!
//! Self-analysis runs every rule once in recording mode. Each primitive the
//! body calls appends a [`Production`] to the innermost open sequence, and
//! every `or`/`many`/`option`/`at_least_one` call site becomes a
//! [`Decision`] keyed by its rule and source location.

use std::panic::Location;

use lm_lexer::TokenKind;
use rustc_hash::FxHashMap;

use crate::grammar::RuleId;
use crate::DefinitionIssue;

/// Identifies a decision point: the call site of a primitive inside a rule.
pub(crate) type DecisionKey = (RuleId, &'static Location<'static>);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct DecisionId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DecisionKind {
    Option,
    Many,
    AtLeastOne,
    Alternation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Production {
    Terminal(TokenKind),
    NonTerminal(RuleId),
    Decision(DecisionId),
}

#[derive(Debug)]
pub(crate) struct Decision {
    pub(crate) key: DecisionKey,
    pub(crate) kind: DecisionKind,
    /// Alternatives of an alternation; the single body otherwise.
    pub(crate) alternatives: Vec<Vec<Production>>,
}

impl Decision {
    pub(crate) fn body(&self) -> &[Production] {
        self.alternatives.first().map_or(&[], Vec::as_slice)
    }
}

/// The recorded grammar.
#[derive(Debug, Default)]
pub(crate) struct Gast {
    /// Top-level sequence of each rule, by rule index.
    pub(crate) rules: Vec<Vec<Production>>,
    pub(crate) names: Vec<String>,
    pub(crate) decisions: Vec<Decision>,
}

impl Gast {
    pub(crate) fn rule(&self, id: RuleId) -> &[Production] {
        &self.rules[id.index()]
    }

    pub(crate) fn name(&self, id: RuleId) -> &str {
        &self.names[id.index()]
    }

    pub(crate) fn decision(&self, id: DecisionId) -> &Decision {
        &self.decisions[id.0]
    }
}

/// Recording-mode state of a recognizer.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    gast: Gast,
    seen: FxHashMap<DecisionKey, DecisionId>,
    /// Open sequences, innermost last.
    frames: Vec<Vec<Production>>,
    pub(crate) issues: Vec<DefinitionIssue>,
}

impl Recorder {
    pub(crate) fn begin_rule(&mut self, name: &str) {
        self.gast.names.push(name.to_owned());
        self.frames.clear();
        self.frames.push(Vec::new());
    }

    pub(crate) fn end_rule(&mut self) {
        let body = self.frames.pop().unwrap_or_default();
        self.gast.rules.push(body);
    }

    pub(crate) fn push(&mut self, production: Production) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(production);
        }
    }

    pub(crate) fn open(&mut self) {
        self.frames.push(Vec::new());
    }

    pub(crate) fn close(&mut self) -> Vec<Production> {
        self.frames.pop().unwrap_or_default()
    }

    pub(crate) fn unresolved(&mut self, reference: &str) {
        let issue = DefinitionIssue::UnresolvedRule {
            rule: self.gast.names.last().cloned().unwrap_or_default(),
            reference: reference.to_owned(),
        };
        if !self.issues.contains(&issue) {
            self.issues.push(issue);
        }
    }

    pub(crate) fn decision(
        &mut self,
        key: DecisionKey,
        kind: DecisionKind,
        alternatives: Vec<Vec<Production>>,
    ) {
        let id = DecisionId(self.gast.decisions.len());
        if self.seen.insert(key, id).is_some() {
            let rule = self.gast.names.last().cloned().unwrap_or_default();
            let issue = DefinitionIssue::SharedDecisionPoint {
                rule,
                location: key.1,
            };
            if !self.issues.contains(&issue) {
                self.issues.push(issue);
            }
        }
        if kind == DecisionKind::Alternation && alternatives.is_empty() {
            self.issues.push(DefinitionIssue::EmptyAlternation {
                rule: self.gast.names.last().cloned().unwrap_or_default(),
                location: key.1,
            });
        }
        self.gast.decisions.push(Decision {
            key,
            kind,
            alternatives,
        });
        self.push(Production::Decision(id));
    }

    pub(crate) fn finish(self) -> (Gast, Vec<DefinitionIssue>) {
        (self.gast, self.issues)
    }
}
