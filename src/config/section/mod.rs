//! Configuration section definitions.
//!
//! Each module corresponds to a section in `razorpack.toml`:
//!
//! | Module    | TOML Section    | Purpose                                  |
//! |-----------|-----------------|------------------------------------------|
//! | `entry`   | `[entry]`       | Named entry points                       |
//! | `output`  | `[output]`      | Paths, filename templates, library       |
//! | `module`  | `[module]`      | Rule table                               |
//! | `resolve` | `[resolve]`     | Extension probing, module directories    |
//! | `plugin`  | `[[plugins]]`   | Lifecycle plugins                        |
//! | `stats`   | `[stats]`       | Terminal output                          |

mod entry;
mod module;
mod output;
mod plugin;
mod resolve;
mod stats;

pub use entry::Entries;
pub use module::ModuleConfig;
pub use output::{LibraryTarget, OutputConfig, OutputFormat};
pub use plugin::{
    CleanOptions, DefineOptions, HashedModuleIdsOptions, HtmlOptions, Inject, ManifestOptions,
    MinifyOptions, PluginConfig, PluginEntry, ProvideOptions, RuntimeChunkOptions,
    SplitChunksOptions, validate_plugins,
};
pub use resolve::ResolveSectionConfig;
pub use stats::StatsConfig;
