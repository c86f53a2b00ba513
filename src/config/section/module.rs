//! `[module]` section configuration: the rule table.
//!
//! # Example
//!
//! ```toml
//! [[module.rules]]
//! test = '\.tsx?$'
//! use = "typescript"
//!
//! [[module.rules]]
//! test = '\.css$'
//! use = [{ loader = "css", options = { minify = false } }]
//! kind = "style"
//!
//! [[module.rules]]
//! test = '\.(png|svg|jpg|gif|woff2?|eot|ttf|otf)$'
//! exclude = '^node_modules/'
//! use = "file"
//! ```
//!
//! Rules are tried in order; the first match wins. Compiled into
//! [`crate::rule::RuleTable`].

use crate::core::ModuleKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Ordered rule list.
    pub rules: Vec<RuleConfig>,

    /// Reject assets no rule matches instead of passing them through.
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Regex matched against the root-relative, `/`-separated path.
    pub test: String,

    /// Regex of paths to skip even when `test` matches.
    #[serde(default)]
    pub exclude: Option<String>,

    /// Stage chain, applied in declaration order.
    #[serde(rename = "use", alias = "loader", alias = "loaders")]
    pub stages: OneOrMany<StageRef>,

    /// Explicit module kind; inferred from the stages when absent.
    #[serde(default)]
    pub kind: Option<ModuleKind>,
}

static NO_OPTIONS: Value = Value::Null;

/// A stage reference: `"css"` or `{ loader = "css", options = { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageRef {
    Name(String),
    Detailed {
        loader: String,
        #[serde(default)]
        options: Value,
    },
}

impl StageRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed { loader, .. } => loader,
        }
    }

    /// Stage options; `Null` when none were given.
    pub fn options(&self) -> &Value {
        match self {
            Self::Name(_) => &NO_OPTIONS,
            Self::Detailed { options, .. } => options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(item) => std::slice::from_ref(item),
            Self::Many(items) => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_use_forms() {
        let rules: Vec<RuleConfig> = serde_json::from_value(json!([
            { "test": "\\.ts$", "loader": "typescript" },
            { "test": "\\.css$", "use": ["css", { "loader": "style-inject" }] },
            { "test": "\\.less$", "use": { "loader": "css", "options": { "minify": true } }, "kind": "style" },
        ]))
        .unwrap();

        assert_eq!(rules[0].stages.as_slice(), [StageRef::Name("typescript".into())]);

        let names: Vec<_> = rules[1].stages.as_slice().iter().map(StageRef::name).collect();
        assert_eq!(names, ["css", "style-inject"]);
        assert!(rules[1].stages.as_slice()[1].options().is_null());

        assert_eq!(rules[2].stages.as_slice()[0].options()["minify"], true);
        assert_eq!(rules[2].kind, Some(ModuleKind::Style));
    }
}
