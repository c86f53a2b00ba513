//! Rule table: ordered `(pattern, stage chain)` pairs.
//!
//! Compiled once per build from `[module]`. Classification is a linear scan;
//! the first rule whose `test` matches (and whose `exclude` does not) wins.

use crate::config::{ConfigDiagnostics, FieldPath, ModuleConfig};
use crate::core::ModuleKind;
use crate::stage::{StageChain, StageRegistry};
use regex::Regex;

/// A compiled rule.
#[derive(Debug)]
pub struct Rule {
    index: usize,
    test: Regex,
    exclude: Option<Regex>,
    chain: StageChain,
    kind: ModuleKind,
}

impl Rule {
    /// Position in the configured rule list.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn chain(&self) -> &StageChain {
        &self.chain
    }

    /// Effective module kind of assets this rule processes.
    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        self.test.as_str()
    }

    fn matches(&self, path: &str) -> bool {
        self.test.is_match(path) && !self.exclude.as_ref().is_some_and(|ex| ex.is_match(path))
    }
}

#[derive(Debug, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
    strict: bool,
}

impl RuleTable {
    /// Compile `[module]`, reporting bad patterns and unknown stages.
    ///
    /// Invalid rules are skipped; the caller fails on `diag.has_errors()`.
    pub fn compile(
        config: &ModuleConfig,
        registry: &StageRegistry,
        diag: &mut ConfigDiagnostics,
    ) -> Self {
        let mut rules = Vec::with_capacity(config.rules.len());

        for (i, rule) in config.rules.iter().enumerate() {
            let mut valid = true;

            let test = match Regex::new(&rule.test) {
                Ok(re) => Some(re),
                Err(e) => {
                    diag.error(
                        FieldPath::indexed("module.rules", i, "test"),
                        format!("invalid pattern: {e}"),
                    );
                    valid = false;
                    None
                }
            };

            let exclude = match rule.exclude.as_deref().map(Regex::new) {
                Some(Ok(re)) => Some(re),
                Some(Err(e)) => {
                    diag.error(
                        FieldPath::indexed("module.rules", i, "exclude"),
                        format!("invalid pattern: {e}"),
                    );
                    valid = false;
                    None
                }
                None => None,
            };

            let mut chain = StageChain::new();
            for stage_ref in rule.stages.as_slice() {
                let Some(stage) = registry.get(stage_ref.name()) else {
                    diag.error_with_hint(
                        FieldPath::indexed("module.rules", i, "use"),
                        format!("unknown stage `{}`", stage_ref.name()),
                        format!("available: {}", registry.names().join(", ")),
                    );
                    valid = false;
                    continue;
                };
                if let Err(message) = stage.validate_options(stage_ref.options()) {
                    diag.error(
                        FieldPath::indexed("module.rules", i, "use"),
                        format!("`{}`: {message}", stage_ref.name()),
                    );
                    valid = false;
                }
                chain.push(stage, stage_ref.options().clone());
            }

            if let (true, Some(test)) = (valid, test) {
                let kind = rule
                    .kind
                    .or_else(|| chain.produced_kind())
                    .unwrap_or(ModuleKind::Script);
                rules.push(Rule {
                    index: i,
                    test,
                    exclude,
                    chain,
                    kind,
                });
            }
        }

        Self {
            rules,
            strict: config.strict,
        }
    }

    /// First rule matching the root-relative path.
    pub fn classify(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    /// Reject unmatched assets instead of passing them through.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
