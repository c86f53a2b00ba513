//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Lexical normalization, root-relative keys, containment checks

pub mod fs;

pub use fs::{is_within, normalize_lexically, relative_key, resolve_path};
