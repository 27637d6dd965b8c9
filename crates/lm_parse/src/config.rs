//! Parser configuration.

/// Options fixed when a grammar is analysed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// Rule parsing starts from; the first defined rule when `None`.
    pub start_rule: Option<String>,
    /// Depth of the lookahead paths computed for each decision point.
    pub max_lookahead: usize,
    /// Recover from a mismatched token by deleting a single unexpected
    /// token when the one after it is the expected one.
    pub recovery_enabled: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            start_rule: None,
            max_lookahead: 3,
            recovery_enabled: false,
        }
    }
}

impl ParserConfig {
    #[must_use]
    pub fn with_start_rule(mut self, name: impl Into<String>) -> Self {
        self.start_rule = Some(name.into());
        self
    }

    /// Set the lookahead depth; values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_lookahead(mut self, k: usize) -> Self {
        self.max_lookahead = k.max(1);
        self
    }

    #[must_use]
    pub fn with_recovery(mut self, enabled: bool) -> Self {
        self.recovery_enabled = enabled;
        self
    }
}
