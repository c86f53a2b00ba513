//! Core types - pure abstractions shared across the codebase.

mod category;
mod driver;
mod state;

pub use category::ModuleKind;
pub use driver::BuildMode;
pub use state::{BuildState, CancelFlag, setup_shutdown_handler};
