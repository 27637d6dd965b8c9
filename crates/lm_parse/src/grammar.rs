//! Rule registration.
//!
//! Rules are closures over a [`Recognizer`] registered under a name and
//! invoked by name (`r.subrule("expression")`), so mutually recursive rules
//! need no references to each other.

use std::fmt;
use std::sync::Arc;

use lm_lexer::HighlightLexer;
use rustc_hash::FxHashMap;

use crate::{GrammarError, HighlightParser, ParseResult, ParserConfig, Recognizer};

/// Index of a rule in its grammar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "rule counts are bounded by registered closures"
    )]
    pub(crate) const fn from_index(index: usize) -> RuleId {
        RuleId(index as u32)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

pub(crate) type RuleBody<T> =
    Arc<dyn Fn(&mut Recognizer<'_, T>) -> ParseResult<T> + Send + Sync + 'static>;

pub(crate) struct Rule<T> {
    pub(crate) name: String,
    pub(crate) body: RuleBody<T>,
}

/// Registered rules. The first definition of a name wins the lookup;
/// duplicates are reported by self-analysis.
pub(crate) struct RuleTable<T> {
    pub(crate) rules: Vec<Rule<T>>,
    pub(crate) by_name: FxHashMap<String, RuleId>,
}

impl<T> RuleTable<T> {
    pub(crate) fn get(&self, id: RuleId) -> &Rule<T> {
        &self.rules[id.index()]
    }

    pub(crate) fn id(&self, name: &str) -> Option<RuleId> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn name(&self, id: RuleId) -> &str {
        &self.rules[id.index()].name
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = RuleId> {
        (0..self.rules.len()).map(RuleId::from_index)
    }

    pub(crate) fn len(&self) -> usize {
        self.rules.len()
    }
}

/// Collects the rules of a grammar before analysis.
///
/// ```text
/// let mut grammar = GrammarBuilder::new(lexer);
/// grammar.rule("sum", move |r| {
///     let mut total = r.subrule("number")?;
///     r.many(|r| {
///         r.consume(plus)?;
///         let rhs = r.subrule("number")?;
///         r.action(|| total += rhs);
///         Ok(())
///     })?;
///     Ok(total)
/// });
/// let parser = grammar.perform_self_analysis(ParserConfig::default())?;
/// ```
pub struct GrammarBuilder<T> {
    pub(crate) lexer: HighlightLexer,
    pub(crate) rules: RuleTable<T>,
}

impl<T: Default> GrammarBuilder<T> {
    pub fn new(lexer: HighlightLexer) -> Self {
        GrammarBuilder {
            lexer,
            rules: RuleTable {
                rules: Vec::new(),
                by_name: FxHashMap::default(),
            },
        }
    }

    /// Register a rule. The first registered rule is the default start rule.
    ///
    /// The body runs once in recording mode during self-analysis, where
    /// every primitive returns a default value and actions are skipped;
    /// computations that must only see real input belong in
    /// [`Recognizer::action`].
    pub fn rule<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(&mut Recognizer<'_, T>) -> ParseResult<T> + Send + Sync + 'static,
    {
        let name = name.into();
        let id = RuleId::from_index(self.rules.rules.len());
        self.rules.by_name.entry(name.clone()).or_insert(id);
        self.rules.rules.push(Rule {
            name,
            body: Arc::new(body),
        });
        self
    }

    /// Validate the grammar and build a parser from it.
    pub fn perform_self_analysis(
        self,
        config: ParserConfig,
    ) -> Result<HighlightParser<T>, GrammarError> {
        HighlightParser::analyse(self, config)
    }
}

impl<T> fmt::Debug for GrammarBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarBuilder")
            .field("rules", &self.rules.rules.iter().map(|r| &r.name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
