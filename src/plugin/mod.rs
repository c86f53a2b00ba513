//! Lifecycle plugins.
//!
//! Plugins are built from `[[plugins]]` tables and bound to one or more
//! lifecycle points. At each point the active plugins run sequentially, in
//! registration order, with `&mut` access to the [`BuildContext`].
//!
//! | Plugin              | Point         |
//! |---------------------|---------------|
//! | `clean`             | PreBuild      |
//! | `define`            | ResolveConfig |
//! | `provide`           | ResolveConfig |
//! | `split-chunks`      | Optimize      |
//! | `runtime-chunk`     | Optimize      |
//! | `hashed-module-ids` | Optimize      |
//! | `minify`            | Optimize      |
//! | `html`              | Emit          |
//! | `manifest`          | Emit          |

mod clean;
mod define;
mod html;
mod manifest;
mod minify;
mod module_ids;
mod provide;
mod runtime;
mod split;

use crate::config::{PackConfig, PluginConfig};
use crate::pipeline::{BuildContext, BuildError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePoint {
    PreBuild,
    ResolveConfig,
    Optimize,
    Emit,
}

impl LifecyclePoint {
    pub const fn name(self) -> &'static str {
        match self {
            Self::PreBuild => "pre-build",
            Self::ResolveConfig => "resolve-config",
            Self::Optimize => "optimize",
            Self::Emit => "emit",
        }
    }
}

impl fmt::Display for LifecyclePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Plugin {
    fn name(&self) -> &'static str;

    fn points(&self) -> &'static [LifecyclePoint];

    fn on(&self, point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> anyhow::Result<()>;
}

/// Plugins of one build, in registration order.
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate the plugins active in the configured mode.
    pub fn from_config(config: &PackConfig) -> Self {
        let mut set = Self::new();
        for entry in config.active_plugins() {
            set.push(instantiate(&entry.plugin));
        }
        set
    }

    pub fn push(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.iter().map(|p| p.name())
    }

    /// Run every plugin bound to `point`. The first failure aborts.
    pub fn run(&self, point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        for plugin in self.plugins.iter().filter(|p| p.points().contains(&point)) {
            crate::debug!("plugin"; "{} @ {}", plugin.name(), point);
            plugin.on(point, ctx).map_err(|err| BuildError::Plugin {
                plugin: plugin.name(),
                point,
                source: err.into(),
            })?;
        }
        Ok(())
    }
}

fn instantiate(config: &PluginConfig) -> Box<dyn Plugin> {
    match config {
        PluginConfig::Clean(opts) => Box::new(clean::Clean(opts.clone())),
        PluginConfig::Define(opts) => Box::new(define::Define(opts.clone())),
        PluginConfig::Provide(opts) => Box::new(provide::Provide(opts.clone())),
        PluginConfig::SplitChunks(opts) => Box::new(split::SplitChunks(opts.clone())),
        PluginConfig::RuntimeChunk(opts) => Box::new(runtime::RuntimeChunk(opts.clone())),
        PluginConfig::HashedModuleIds(opts) => Box::new(module_ids::HashedModuleIds(opts.clone())),
        PluginConfig::Minify(opts) => Box::new(minify::Minify(opts.clone())),
        PluginConfig::Html(opts) => Box::new(html::Html(opts.clone())),
        PluginConfig::Manifest(opts) => Box::new(manifest::Manifest(opts.clone())),
    }
}
