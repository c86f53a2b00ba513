//! Transformation stages and their registry.
//!
//! A stage takes an asset (path + content + optional source map) and
//! returns a new one. Rules name stages; the [`StageChain`] built for a rule
//! applies them left to right, so `[a, b]` on input `x` yields `b(a(x))`.
//!
//! # Built-in stages
//!
//! | Name          | Produces | Purpose                                     |
//! |---------------|----------|---------------------------------------------|
//! | `identity`    | -        | Pass-through (alias `raw`)                  |
//! | `typescript`  | script   | Strip types, lower TS syntax (alias `ts`)   |
//! | `javascript`  | script   | Parse-check and reprint (alias `js`)        |
//! | `json`        | script   | `module.exports = <json>`                   |
//! | `css`         | style    | Parse and print CSS                         |
//! | `style-inject`| script   | Wrap CSS into a `<style>` injecting script  |
//! | `html`        | script   | `module.exports = "<html string>"`          |
//! | `file`        | file     | Emit as a standalone file                   |
//! | `minify-js`   | script   | Minify a script                             |
//! | `minify-css`  | style    | Minify a stylesheet                         |

mod builtin;
mod chain;
pub mod minify;
mod sourcemap;

pub use chain::StageChain;
pub use sourcemap::SourceMap;

use crate::core::ModuleKind;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Content flowing through a stage chain.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Root-relative path with `/` separators.
    pub path: String,
    pub content: Vec<u8>,
    pub map: Option<SourceMap>,
}

impl Asset {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            map: None,
        }
    }

    /// Content as UTF-8 text.
    pub fn text(&self) -> Result<&str, StageError> {
        std::str::from_utf8(&self.content)
            .map_err(|e| StageError::new(format!("content is not valid UTF-8: {e}")))
    }

    /// Replace the content, keeping the current source map.
    pub fn with_content(self, content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            ..self
        }
    }

    /// Replace the content and source map.
    pub fn with_output(self, content: impl Into<Vec<u8>>, map: Option<SourceMap>) -> Self {
        Self {
            content: content.into(),
            map,
            ..self
        }
    }

    /// File name of the asset path (`src/a.ts` → `a.ts`).
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn path_buf(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

/// Per-invocation inputs besides the asset itself.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    /// Options from the rule's stage reference (`Null` when none).
    pub options: &'a Value,
    /// Whether stages should produce source maps.
    pub source_maps: bool,
}

/// Failure inside a single stage.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StageError {
    message: String,
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A named, pure transformation of one asset.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Module kind the output belongs to, if the stage changes it.
    fn produces(&self) -> Option<ModuleKind> {
        None
    }

    /// Check rule-supplied options once, when the rule table is compiled.
    fn validate_options(&self, _options: &Value) -> Result<(), String> {
        Ok(())
    }

    fn apply(&self, asset: Asset, cx: &StageContext<'_>) -> Result<Asset, StageError>;
}

/// Name → stage lookup.
#[derive(Clone)]
pub struct StageRegistry {
    stages: FxHashMap<String, Arc<dyn Stage>>,
}

impl StageRegistry {
    /// Empty registry (no built-ins).
    pub fn empty() -> Self {
        Self {
            stages: FxHashMap::default(),
        }
    }

    /// Registry with all built-in stages and their aliases.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        builtin::register_all(&mut registry);
        registry
    }

    /// Register a stage under its own name.
    pub fn register(&mut self, stage: Arc<dyn Stage>) {
        self.stages.insert(stage.name().to_string(), stage);
    }

    /// Register an existing stage under another name.
    pub fn alias(&mut self, alias: &str, target: &str) {
        if let Some(stage) = self.stages.get(target).cloned() {
            self.stages.insert(alias.to_string(), stage);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Stage>> {
        self.stages.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.stages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Stages for exercising chains and rules.

    use super::*;

    /// Appends a suffix to text content.
    pub struct Append(pub &'static str, pub &'static str);

    impl Stage for Append {
        fn name(&self) -> &'static str {
            self.0
        }

        fn apply(&self, asset: Asset, _cx: &StageContext<'_>) -> Result<Asset, StageError> {
            let text = format!("{}{}", asset.text()?, self.1);
            Ok(asset.with_content(text))
        }
    }

    /// Always fails.
    pub struct Fail(pub &'static str);

    impl Stage for Fail {
        fn name(&self) -> &'static str {
            self.0
        }

        fn apply(&self, _asset: Asset, _cx: &StageContext<'_>) -> Result<Asset, StageError> {
            Err(StageError::new("unexpected token"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_names_and_aliases() {
        let registry = StageRegistry::builtin();
        for name in [
            "identity",
            "raw",
            "typescript",
            "ts",
            "javascript",
            "js",
            "json",
            "css",
            "style-inject",
            "html",
            "file",
            "minify-js",
            "minify-css",
        ] {
            assert!(registry.get(name).is_some(), "missing stage {name}");
        }
        assert_eq!(registry.get("ts").unwrap().name(), "typescript");
        assert!(registry.get("less").is_none());
    }

    #[test]
    fn test_asset_helpers() {
        let asset = Asset::new("src/app/main.ts", "let a = 1;");
        assert_eq!(asset.file_name(), "main.ts");
        assert_eq!(asset.text().unwrap(), "let a = 1;");
        assert!(Asset::new("x.bin", vec![0xff, 0xfe]).text().is_err());
    }
}
