//! `[output]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [output]
//! path = "dist"
//! filename = "[name].[chunkhash].js"
//! style_filename = "[name].[contenthash].css"
//! asset_filename = "[hash].[ext]"
//! public_path = "/dist/"
//! library = "aspAndWebpack"     # global binding for the entry's exports
//! library_target = "var"        # var | assign | window
//! format = "modules"            # concat | modules
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How script chunks are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Module sources joined in entry order, no runtime.
    #[default]
    Concat,
    /// Modules wrapped in factories and registered with a small runtime.
    Modules,
}

/// Binding style for `output.library`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryTarget {
    /// `var name = ...;`
    #[default]
    Var,
    /// `name = ...;`
    Assign,
    /// `window["name"] = ...;`
    Window,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory (relative to the project root).
    pub path: PathBuf,

    /// Script chunk filename template.
    #[serde(alias = "filename_template", alias = "filenameTemplate")]
    pub filename: String,

    /// Extracted stylesheet filename template.
    #[serde(alias = "styleFilename")]
    pub style_filename: String,

    /// Filename template for `file` modules.
    #[serde(alias = "assetFilename")]
    pub asset_filename: String,

    /// URL prefix the output directory is served from.
    #[serde(alias = "publicPath")]
    pub public_path: String,

    /// Global name the entry exports are bound to.
    pub library: Option<String>,

    #[serde(alias = "libraryTarget")]
    pub library_target: LibraryTarget,

    pub format: OutputFormat,

    /// Hex digits kept from content and chunk hashes.
    #[serde(alias = "hashLength")]
    pub hash_length: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "dist".into(),
            filename: "[name].[chunkhash].js".into(),
            style_filename: "[name].[contenthash].css".into(),
            asset_filename: "[hash].[ext]".into(),
            public_path: "/".into(),
            library: None,
            library_target: LibraryTarget::default(),
            format: OutputFormat::default(),
            hash_length: 20,
        }
    }
}

impl OutputConfig {
    pub fn validate(&self, entry_count: usize, diag: &mut ConfigDiagnostics) {
        if self.hash_length == 0 || self.hash_length > 64 {
            diag.error(
                FieldPath::new("output.hash_length"),
                format!("must be between 1 and 64, got {}", self.hash_length),
            );
        }

        for (field, template) in [
            (FieldPath::new("output.filename"), &self.filename),
            (FieldPath::new("output.style_filename"), &self.style_filename),
            (FieldPath::new("output.asset_filename"), &self.asset_filename),
        ] {
            if template.trim().is_empty() {
                diag.error(field, "filename template is empty");
            }
        }

        if entry_count > 1 && !has_distinguishing_token(&self.filename) {
            diag.error_with_hint(
                FieldPath::new("output.filename"),
                format!("{entry_count} entries would all be written to `{}`", self.filename),
                "include `[name]` or `[chunkhash]` in the template",
            );
        }

        if let Some(library) = &self.library {
            if self.format == OutputFormat::Concat {
                diag.error_with_hint(
                    FieldPath::new("output.library"),
                    "exposing a library requires the module runtime",
                    "set `output.format = \"modules\"`",
                );
            }
            if !is_js_identifier(library) {
                diag.error(
                    FieldPath::new("output.library"),
                    format!("`{library}` is not a valid JavaScript identifier"),
                );
            }
        }

        if !self.public_path.is_empty() && !self.public_path.ends_with('/') {
            diag.warn(
                FieldPath::new("output.public_path"),
                "does not end with `/`, URLs are formed by plain concatenation",
            );
        }
    }
}

fn has_distinguishing_token(template: &str) -> bool {
    template.contains("[name]") || template.contains("[chunkhash")
}

/// ASCII identifier check: `[A-Za-z_$][A-Za-z0-9_$]*`.
pub fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
