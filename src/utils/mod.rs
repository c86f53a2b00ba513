//! Utility modules shared across the build.

pub mod hash;
pub mod path;
pub mod plural;

pub use plural::plural_count;
