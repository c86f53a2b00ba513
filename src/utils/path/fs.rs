//! Path normalization utilities.
//!
//! - `normalize_lexically` - fold `.` and `..` without touching the disk
//! - `relative_key` - root-relative, `/`-separated key used by rules and ids
//! - `resolve_path` - resolve relative paths with fallback directory

use std::path::{Component, Path, PathBuf};

/// Fold `.` and `..` components without resolving symlinks.
///
/// A `..` that would climb above a relative path's start is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Root-relative path with `/` separators.
///
/// Paths outside `root` keep their full (normalized) form.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let path = normalize_lexically(path);
    let root = normalize_lexically(root);
    let rel = path.strip_prefix(&root).unwrap_or(&path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `path` stays inside `dir` after lexical normalization.
pub fn is_within(dir: &Path, path: &Path) -> bool {
    normalize_lexically(path).starts_with(normalize_lexically(dir))
}

/// Resolve a path that may be relative to cwd or a fallback directory.
///
/// Tries in order:
/// 1. If absolute, use as-is
/// 2. If exists relative to cwd, make absolute
/// 3. Otherwise, resolve relative to fallback_dir
pub fn resolve_path(path: &Path, fallback_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    if path.exists() {
        return std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path));
    }

    fallback_dir.join(path)
}
