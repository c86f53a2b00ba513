//! `[resolve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [resolve]
//! extensions = [".ts", ".tsx", ".js", ".json", ".html"]
//! modules = ["node_modules"]
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveSectionConfig {
    /// Extensions tried, in order, when a request omits one.
    pub extensions: Vec<String>,

    /// Directories searched for bare requests (`jquery`).
    pub modules: Vec<PathBuf>,
}

impl Default for ResolveSectionConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".js".into(), ".json".into()],
            modules: vec!["node_modules".into()],
        }
    }
}

impl ResolveSectionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (i, ext) in self.extensions.iter().enumerate() {
            if !ext.starts_with('.') || ext.len() < 2 {
                diag.error_with_hint(
                    FieldPath::indexed("resolve.extensions", i, ""),
                    format!("`{ext}` is not an extension"),
                    "extensions start with a dot, e.g. \".ts\"",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_must_start_with_dot() {
        let resolve = ResolveSectionConfig {
            extensions: vec![".ts".into(), "js".into()],
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        resolve.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field.as_str(), "resolve.extensions[1]");
    }
}
