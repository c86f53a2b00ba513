//! Modules, chunks and their rendering into output artifacts.
//!
//! ```text
//! bundle/
//! ├── module.rs      # Module: key, id, kind, code, source map
//! ├── chunk.rs       # Chunk, ModuleGraph, chunk hashes
//! ├── substitute.rs  # define/provide identifier substitution
//! ├── render.rs      # concat / modules rendering, source maps
//! └── artifact.rs    # OutputSet, public URLs
//! ```

mod artifact;
mod chunk;
mod module;
mod render;
mod substitute;

pub use artifact::{Artifact, ArtifactKind, OutputSet, public_url};
pub use chunk::{Chunk, ModuleGraph, ModuleIdx};
pub use module::{Module, ModuleSource};
pub use render::{RenderError, render};
pub use substitute::{Definitions, ProvideBinding};
