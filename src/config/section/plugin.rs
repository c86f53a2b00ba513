//! `[[plugins]]` configuration.
//!
//! # Example
//!
//! ```toml
//! [[plugins]]
//! name = "clean"
//! verbose = true
//!
//! [[plugins]]
//! name = "define"
//! env = ["NODE_ENV"]
//!
//! [[plugins]]
//! name = "provide"
//! bindings = { "$" = "jquery", jQuery = "jquery", "window.jQuery" = "jquery" }
//!
//! [[plugins]]
//! name = "split-chunks"
//! chunk = "vendor"
//!
//! [[plugins]]
//! name = "minify"
//! modes = ["production"]
//!
//! [[plugins]]
//! name = "html"
//! template = "Views/Shared/_Layout_Template.cshtml"
//! filename = "../Views/Shared/_Layout.cshtml"
//! inject = "body"
//! ```
//!
//! Plugins run in the order listed. Overlay plugin lists are appended to the
//! base list, so an overlay `define` runs after (and overrides) a base one.

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::BuildMode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One `[[plugins]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginEntry {
    /// Restrict the plugin to these modes (empty = all modes).
    #[serde(default)]
    pub modes: Vec<BuildMode>,

    #[serde(flatten)]
    pub plugin: PluginConfig,
}

impl PluginEntry {
    pub fn is_active(&self, mode: BuildMode) -> bool {
        self.modes.is_empty() || self.modes.contains(&mode)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum PluginConfig {
    Clean(CleanOptions),
    Define(DefineOptions),
    Provide(ProvideOptions),
    SplitChunks(SplitChunksOptions),
    RuntimeChunk(RuntimeChunkOptions),
    HashedModuleIds(HashedModuleIdsOptions),
    Minify(MinifyOptions),
    Html(HtmlOptions),
    Manifest(ManifestOptions),
}

impl PluginConfig {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Clean(_) => "clean",
            Self::Define(_) => "define",
            Self::Provide(_) => "provide",
            Self::SplitChunks(_) => "split-chunks",
            Self::RuntimeChunk(_) => "runtime-chunk",
            Self::HashedModuleIds(_) => "hashed-module-ids",
            Self::Minify(_) => "minify",
            Self::Html(_) => "html",
            Self::Manifest(_) => "manifest",
        }
    }

    /// Whether the plugin only works with the module runtime.
    pub const fn needs_runtime(&self) -> bool {
        matches!(self, Self::Provide(_) | Self::RuntimeChunk(_))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Log every stale file removed at publish time.
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefineOptions {
    /// Identifier → replacement. Nested tables flatten to dotted keys;
    /// string values are inserted as code, other values as JSON.
    pub definitions: Map<String, Value>,

    /// Environment variables exposed as `process.env.NAME`.
    pub env: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvideOptions {
    /// Free identifier (or dotted expression) → module request.
    pub bindings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitChunksOptions {
    /// Name of the commons chunk (an existing entry name or a new chunk).
    pub chunk: String,

    /// Minimum number of entry chunks sharing a module before it moves.
    /// Defaults to the number of entry chunks (at least 2).
    #[serde(default)]
    pub min_chunks: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeChunkOptions {
    pub chunk: String,
}

impl Default for RuntimeChunkOptions {
    fn default() -> Self {
        Self {
            chunk: "runtime".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashedModuleIdsOptions {
    /// Hex digits per module id.
    pub length: usize,
}

impl Default for HashedModuleIdsOptions {
    fn default() -> Self {
        Self { length: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinifyOptions {
    pub scripts: bool,
    pub styles: bool,
    /// Rename local bindings in scripts.
    pub mangle: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            scripts: true,
            styles: true,
            mangle: true,
        }
    }
}

/// Where injected `<script>` tags go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inject {
    Head,
    #[default]
    Body,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlOptions {
    /// Host-page template (relative to the project root).
    pub template: PathBuf,

    /// Generated file (relative to the output directory).
    pub filename: PathBuf,

    #[serde(default)]
    pub inject: Inject,

    /// Only inject these chunks (all when empty).
    #[serde(default)]
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestOptions {
    pub filename: String,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            filename: "manifest.json".into(),
        }
    }
}

/// Validate the plugin list against the rest of the configuration.
pub fn validate_plugins(
    plugins: &[PluginEntry],
    modules_format: bool,
    root: &Path,
    diag: &mut ConfigDiagnostics,
) {
    for (i, entry) in plugins.iter().enumerate() {
        let plugin = &entry.plugin;

        if plugin.needs_runtime() && !modules_format {
            diag.error_with_hint(
                FieldPath::indexed("plugins", i, ""),
                format!("`{}` requires the module runtime", plugin.name()),
                "set `output.format = \"modules\"`",
            );
        }

        match plugin {
            PluginConfig::SplitChunks(opts) => {
                if opts.chunk.trim().is_empty() {
                    diag.error(FieldPath::indexed("plugins", i, "chunk"), "chunk name is empty");
                }
                if opts.min_chunks == Some(0) {
                    diag.error(FieldPath::indexed("plugins", i, "min_chunks"), "must be at least 1");
                }
            }
            PluginConfig::HashedModuleIds(opts) if opts.length == 0 || opts.length > 64 => {
                diag.error(
                    FieldPath::indexed("plugins", i, "length"),
                    "must be between 1 and 64",
                );
            }
            PluginConfig::HashedModuleIds(_) if !modules_format => {
                diag.warn(
                    FieldPath::indexed("plugins", i, ""),
                    "module ids are not rendered in the `concat` format",
                );
            }
            PluginConfig::Html(opts) => {
                let template = root.join(&opts.template);
                if !template.is_file() {
                    diag.error(
                        FieldPath::indexed("plugins", i, "template"),
                        format!("template `{}` not found", opts.template.display()),
                    );
                }
            }
            PluginConfig::Define(opts) => {
                for name in &opts.env {
                    if name.is_empty() {
                        diag.error(FieldPath::indexed("plugins", i, "env"), "empty variable name");
                    }
                }
            }
            _ => {}
        }
    }
}
