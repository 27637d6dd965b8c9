//! Static analysis of a recorded grammar.
//!
//! - nullability of every rule (fixpoint)
//! - left recursion, direct or through nullable prefixes
//! - LL(k) lookahead paths for every decision point
//! - ambiguous alternatives (two alternatives sharing a lookahead path)
//!
//! Lookahead paths are computed per decision from the decision's own
//! alternatives, without the context that follows it. A path shorter than
//! `k` is complete: the alternative's input ends there.

use lm_lexer::{TokenKind, Vocabulary};
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};
use tracing::trace;

use crate::gast::{DecisionKey, DecisionKind, Gast, Production};
use crate::grammar::RuleId;
use crate::stack::ensure_sufficient_stack;
use crate::DefinitionIssue;

/// A sequence of at most `k` token kinds.
pub(crate) type Path = SmallVec<[TokenKind; 4]>;

/// Lookahead paths of one decision point.
#[derive(Debug)]
pub(crate) struct DecisionTable {
    /// Paths per alternative. For repetitions and options, the single entry
    /// holds the non-empty paths that enter the body.
    pub(crate) alternatives: Vec<Vec<Path>>,
}

/// Lookahead tables of a grammar, by decision point.
#[derive(Debug, Default)]
pub(crate) struct Lookahead {
    tables: FxHashMap<DecisionKey, DecisionTable>,
}

impl Lookahead {
    pub(crate) fn get(&self, key: &DecisionKey) -> Option<&DecisionTable> {
        self.tables.get(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.tables.len()
    }
}

/// Run every check over `gast`, returning the lookahead tables when the
/// grammar is usable.
pub(crate) fn analyse(
    gast: &Gast,
    vocabulary: &Vocabulary,
    k: usize,
) -> Result<Lookahead, Vec<DefinitionIssue>> {
    let nullable = nullable_rules(gast);
    let issues = left_recursion(gast, &nullable);
    if !issues.is_empty() {
        return Err(issues);
    }

    let mut paths = PathBuilder {
        gast,
        memo: FxHashMap::default(),
    };
    let mut lookahead = Lookahead::default();
    let mut issues = Vec::new();
    for decision in &gast.decisions {
        let alternatives = match decision.kind {
            DecisionKind::Alternation => decision
                .alternatives
                .iter()
                .map(|alt| paths.sequence(alt, k))
                .collect(),
            DecisionKind::Option | DecisionKind::Many | DecisionKind::AtLeastOne => {
                let mut enter = paths.sequence(decision.body(), k);
                enter.retain(|path| !path.is_empty());
                vec![enter]
            }
        };
        if decision.kind == DecisionKind::Alternation {
            issues.extend(ambiguities(gast, vocabulary, decision.key, &alternatives));
        }
        trace!(
            rule = gast.name(decision.key.0),
            location = %decision.key.1,
            ?alternatives,
            "lookahead"
        );
        lookahead.tables.insert(
            decision.key,
            DecisionTable { alternatives },
        );
    }

    if issues.is_empty() {
        Ok(lookahead)
    } else {
        Err(issues)
    }
}

/// Whether each rule can match without consuming input.
pub(crate) fn nullable_rules(gast: &Gast) -> Vec<bool> {
    let mut nullable = vec![false; gast.rules.len()];
    let mut changed = true;
    while changed {
        changed = false;
        for (index, body) in gast.rules.iter().enumerate() {
            if !nullable[index] && sequence_nullable(gast, &nullable, body) {
                nullable[index] = true;
                changed = true;
            }
        }
    }
    nullable
}

fn sequence_nullable(gast: &Gast, nullable: &[bool], seq: &[Production]) -> bool {
    seq.iter()
        .all(|production| production_nullable(gast, nullable, production))
}

fn production_nullable(gast: &Gast, nullable: &[bool], production: &Production) -> bool {
    match production {
        Production::Terminal(_) => false,
        Production::NonTerminal(rule) => nullable[rule.index()],
        Production::Decision(id) => {
            let decision = gast.decision(*id);
            match decision.kind {
                DecisionKind::Option | DecisionKind::Many => true,
                DecisionKind::AtLeastOne => sequence_nullable(gast, nullable, decision.body()),
                DecisionKind::Alternation => decision
                    .alternatives
                    .iter()
                    .any(|alt| sequence_nullable(gast, nullable, alt)),
            }
        }
    }
}

/// Rules that `seq` can invoke before consuming any token.
fn leading_rules(gast: &Gast, nullable: &[bool], seq: &[Production], out: &mut Vec<RuleId>) {
    for production in seq {
        match production {
            Production::Terminal(_) => {}
            Production::NonTerminal(rule) => out.push(*rule),
            Production::Decision(id) => {
                for alt in &gast.decision(*id).alternatives {
                    leading_rules(gast, nullable, alt, out);
                }
            }
        }
        if !production_nullable(gast, nullable, production) {
            break;
        }
    }
}

fn left_recursion(gast: &Gast, nullable: &[bool]) -> Vec<DefinitionIssue> {
    let edges: Vec<Vec<RuleId>> = gast
        .rules
        .iter()
        .map(|body| {
            let mut leading = Vec::new();
            leading_rules(gast, nullable, body, &mut leading);
            leading.sort_unstable();
            leading.dedup();
            leading
        })
        .collect();

    let mut issues = Vec::new();
    for index in 0..gast.rules.len() {
        let start = RuleId::from_index(index);
        let mut visited = vec![false; gast.rules.len()];
        let mut path = vec![start];
        if find_cycle(start, start, &edges, &mut visited, &mut path) {
            issues.push(DefinitionIssue::LeftRecursion {
                rule: gast.name(start).to_owned(),
                path: path.iter().map(|&rule| gast.name(rule).to_owned()).collect(),
            });
        }
    }
    issues
}

/// Depth-first search for a path from `current` back to `start`.
fn find_cycle(
    start: RuleId,
    current: RuleId,
    edges: &[Vec<RuleId>],
    visited: &mut [bool],
    path: &mut Vec<RuleId>,
) -> bool {
    ensure_sufficient_stack(|| {
        for &next in &edges[current.index()] {
            if next == start {
                path.push(next);
                return true;
            }
            if !visited[next.index()] {
                visited[next.index()] = true;
                path.push(next);
                if find_cycle(start, next, edges, visited, path) {
                    return true;
                }
                path.pop();
            }
        }
        false
    })
}

/// Report every pair of alternatives sharing a lookahead path.
fn ambiguities(
    gast: &Gast,
    vocabulary: &Vocabulary,
    key: DecisionKey,
    alternatives: &[Vec<Path>],
) -> Vec<DefinitionIssue> {
    let mut issues = Vec::new();
    for (first, left) in alternatives.iter().enumerate() {
        for (second, right) in alternatives.iter().enumerate().skip(first + 1) {
            let shared = left.iter().find(|a| {
                right.iter().any(|b| {
                    a.len() == b.len()
                        && a.iter().zip(b.iter()).all(|(&x, &y)| vocabulary.overlaps(x, y))
                })
            });
            if let Some(path) = shared {
                issues.push(DefinitionIssue::AmbiguousAlternatives {
                    rule: gast.name(key.0).to_owned(),
                    location: key.1,
                    first,
                    second,
                    path: path
                        .iter()
                        .map(|&kind| vocabulary.name(kind).to_owned())
                        .collect(),
                });
            }
        }
    }
    issues
}

/// Computes lookahead paths, memoizing rule expansions by remaining depth.
struct PathBuilder<'g> {
    gast: &'g Gast,
    memo: FxHashMap<(RuleId, usize), Vec<Path>>,
}

impl PathBuilder<'_> {
    /// Paths of at most `budget` tokens starting a match of `seq`.
    fn sequence(&mut self, seq: &[Production], budget: usize) -> Vec<Path> {
        let mut paths = vec![Path::new()];
        for production in seq {
            if paths.iter().all(|path| path.len() >= budget) {
                break;
            }
            let mut next = Vec::with_capacity(paths.len());
            for path in paths {
                if path.len() >= budget {
                    next.push(path);
                    continue;
                }
                for suffix in self.production(production, budget - path.len()) {
                    next.push(join(&path, &suffix));
                }
            }
            dedup(&mut next);
            paths = next;
        }
        paths
    }

    fn production(&mut self, production: &Production, budget: usize) -> Vec<Path> {
        if budget == 0 {
            return vec![Path::new()];
        }
        let gast = self.gast;
        match production {
            Production::Terminal(kind) => vec![smallvec![*kind]],
            Production::NonTerminal(rule) => {
                if let Some(paths) = self.memo.get(&(*rule, budget)) {
                    return paths.clone();
                }
                let paths = ensure_sufficient_stack(|| self.sequence(gast.rule(*rule), budget));
                self.memo.insert((*rule, budget), paths.clone());
                paths
            }
            Production::Decision(id) => {
                let decision = gast.decision(*id);
                let body = decision.body();
                let mut paths = match decision.kind {
                    DecisionKind::Option => {
                        let mut paths = self.sequence(body, budget);
                        paths.push(Path::new());
                        paths
                    }
                    DecisionKind::Many => self.repetition(body, budget),
                    DecisionKind::AtLeastOne => {
                        let mut paths = Vec::new();
                        for first in self.sequence(body, budget) {
                            if first.len() >= budget {
                                paths.push(first);
                            } else {
                                for rest in self.repetition(body, budget - first.len()) {
                                    paths.push(join(&first, &rest));
                                }
                            }
                        }
                        paths
                    }
                    DecisionKind::Alternation => decision
                        .alternatives
                        .iter()
                        .flat_map(|alt| self.sequence(alt, budget))
                        .collect(),
                };
                dedup(&mut paths);
                paths
            }
        }
    }

    /// Paths of zero or more repetitions of `body`.
    fn repetition(&mut self, body: &[Production], budget: usize) -> Vec<Path> {
        let mut paths = vec![Path::new()];
        if budget == 0 {
            return paths;
        }
        for first in self.sequence(body, budget) {
            if first.is_empty() {
                continue;
            }
            if first.len() >= budget {
                paths.push(first);
            } else {
                for rest in self.repetition(body, budget - first.len()) {
                    paths.push(join(&first, &rest));
                }
            }
        }
        dedup(&mut paths);
        paths
    }
}

fn join(prefix: &Path, suffix: &Path) -> Path {
    let mut joined = prefix.clone();
    joined.extend_from_slice(suffix);
    joined
}

fn dedup(paths: &mut Vec<Path>) {
    paths.sort_unstable();
    paths.dedup();
}
