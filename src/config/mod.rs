//! Configuration management for `razorpack.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Typed section definitions
//! │   ├── entry      # [entry]
//! │   ├── module     # [module] rules
//! │   ├── output     # [output]
//! │   ├── plugin     # [[plugins]]
//! │   ├── resolve    # [resolve]
//! │   └── stats      # [stats]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── merge.rs       # Base + overlay deep merge
//! └── mod.rs         # PackConfig (this file)
//! ```
//!
//! # Loading
//!
//! 1. Read the base document (`razorpack.toml`) into an untyped tree.
//! 2. Pick the mode: `--mode`, then `RAZORPACK_MODE`/`NODE_ENV`, then the
//!    base document's `mode` key, then `production`.
//! 3. Read the overlay (`--overlay`, or `razorpack.<mode>.toml` if present).
//! 4. Merge, then deserialize the merged tree into [`PackConfig`].
//!
//! The result is immutable for the rest of the build.

pub mod merge;
pub mod section;
pub mod types;
mod util;

pub use util::{find_config_file, overlay_path_for};

pub use section::{
    CleanOptions, DefineOptions, Entries, HashedModuleIdsOptions, HtmlOptions,
    Inject, LibraryTarget, ManifestOptions, MinifyOptions, ModuleConfig, OutputConfig,
    OutputFormat, PluginConfig, PluginEntry, ProvideOptions, ResolveSectionConfig,
    RuntimeChunkOptions, SplitChunksOptions, StatsConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::core::BuildMode;
use crate::utils::path::resolve_path;
use crate::{debug, log};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// root configuration
// ============================================================================

/// Level of source-map output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Devtool {
    /// No source maps.
    #[default]
    #[serde(rename = "none")]
    Off,
    /// `.map` file plus a `sourceMappingURL` comment.
    SourceMap,
    /// `.map` file without the comment.
    HiddenSourceMap,
    /// Map embedded as a `data:` URL comment.
    InlineSourceMap,
}

impl Devtool {
    #[inline]
    pub const fn enabled(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Effective configuration of one build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Absolute path of the base document (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Overlay merged on top of the base, if any (internal use only)
    #[serde(skip)]
    pub overlay_path: Option<PathBuf>,

    /// Project root - parent of the base document (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Build mode (always the resolved mode after loading).
    pub mode: BuildMode,

    pub devtool: Devtool,

    /// Worker threads for asset transformation (default: available cores).
    pub parallelism: Option<usize>,

    pub entry: Entries,

    pub output: OutputConfig,

    pub module: ModuleConfig,

    pub resolve: ResolveSectionConfig,

    /// Request → global expression, satisfied at runtime instead of bundled.
    pub externals: BTreeMap<String, String>,

    pub plugins: Vec<PluginEntry>,

    pub stats: StatsConfig,
}

/// Merged, still untyped configuration with the facts used to build it.
#[derive(Debug, Clone)]
pub struct MergedTree {
    pub tree: Value,
    pub mode: BuildMode,
    pub overlay_path: Option<PathBuf>,
}

impl PackConfig {
    /// Load and merge the base document at `base` with its overlay.
    pub fn load(
        base: &Path,
        overlay: Option<&Path>,
        mode: Option<BuildMode>,
    ) -> Result<Self, ConfigError> {
        let merged = Self::load_tree(base, overlay, mode)?;
        let (mut config, ignored) = Self::from_tree(merged.tree)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, base);
        }

        config.mode = merged.mode;
        config.overlay_path = merged.overlay_path;
        config.config_path = base.to_path_buf();
        config.root = base
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Read and merge the documents without deserializing the result.
    pub fn load_tree(
        base: &Path,
        overlay: Option<&Path>,
        mode: Option<BuildMode>,
    ) -> Result<MergedTree, ConfigError> {
        let base_doc = read_document(base)?;

        let mode = mode
            .or_else(BuildMode::from_env)
            .or_else(|| {
                base_doc
                    .get("mode")
                    .and_then(Value::as_str)
                    .and_then(BuildMode::parse)
            })
            .unwrap_or_default();

        let overlay_path = match overlay {
            // `--overlay` is relative to the working directory, else to the base file
            Some(path) => Some(resolve_path(path, base.parent().unwrap_or(Path::new(".")))),
            None => {
                let path = overlay_path_for(base, mode);
                if path.exists() {
                    Some(path)
                } else {
                    debug!("config"; "no overlay at {}, using base only", path.display());
                    None
                }
            }
        };

        let mut tree = match &overlay_path {
            Some(path) => {
                let overlay_doc = read_document(path)?;
                merge::merge(&base_doc, &overlay_doc)
                    .map_err(|e| ConfigError::Merge(path.clone(), e))?
            }
            None => base_doc,
        };

        if let Value::Object(map) = &mut tree {
            map.insert("mode".into(), Value::String(mode.as_str().into()));
        }

        Ok(MergedTree {
            tree,
            mode,
            overlay_path,
        })
    }

    /// Deserialize a merged tree, collecting unknown field paths.
    pub fn from_tree(tree: Value) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let config = serde_ignored::deserialize(tree, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Parse a single TOML document (no overlay).
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let tree: Value =
            toml::from_str(content).map_err(|e| ConfigError::Toml(PathBuf::from("<str>"), e))?;
        Ok(Self::from_tree(tree)?.0)
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} (ignored):", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Structural validation of the effective configuration.
    ///
    /// Rules and stages are validated when the rule table is compiled.
    pub fn validate(&self) -> ConfigDiagnostics {
        let mut diag = ConfigDiagnostics::new();

        if self.entry.is_empty() {
            diag.error_with_hint(
                FieldPath::new("entry"),
                "no entry points",
                "add `[entry]` with at least one `name = \"path\"`",
            );
        }
        for (name, request) in self.entry.iter() {
            if request.requests().is_empty() {
                diag.error(FieldPath::keyed("entry", name), "entry has no files");
            }
        }

        if self.parallelism == Some(0) {
            diag.error(FieldPath::new("parallelism"), "must be at least 1");
        }

        for (request, global) in &self.externals {
            if global.trim().is_empty() {
                diag.error(
                    FieldPath::keyed("externals", request),
                    "global expression is empty",
                );
            }
        }

        self.output.validate(self.entry.len(), &mut diag);
        self.resolve.validate(&mut diag);
        section::validate_plugins(
            &self.plugins,
            self.output.format == OutputFormat::Modules,
            &self.root,
            &mut diag,
        );

        diag
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.path)
    }

    #[inline]
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Plugins active in the current mode, in registration order.
    pub fn active_plugins(&self) -> impl Iterator<Item = &PluginEntry> {
        self.plugins.iter().filter(|p| p.is_active(self.mode))
    }
}

/// Read a TOML document into an untyped tree.
fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let content =
        fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
    let tree: Value =
        toml::from_str(&content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;
    Ok(match tree {
        Value::Null => Value::Object(Map::new()),
        other => other,
    })
}

/// Test helper: parse a config from TOML with `root` as project root.
#[cfg(test)]
pub fn test_parse_config(content: &str, root: &Path) -> PackConfig {
    let mut config = PackConfig::from_toml_str(content).expect("valid test config");
    config.root = root.to_path_buf();
    config.config_path = root.join("razorpack.toml");
    config
}
