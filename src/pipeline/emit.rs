//! Staged emission: write everything aside, then publish with renames.
//!
//! Artifacts inside the output directory are written to a temporary
//! directory next to it; artifacts outside (a host page in `../Views`) go to
//! a temporary file next to their target. Nothing becomes visible until every
//! artifact has been written.

use super::context::PublishOptions;
use super::error::BuildError;
use crate::bundle::OutputSet;
use crate::log;
use crate::utils::path::{is_within, normalize_lexically};
use rustc_hash::FxHashSet;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

// ============================================================================
// Output lock
// ============================================================================

/// Exclusive `<output>.lock` file, removed on drop.
#[derive(Debug)]
pub struct OutputLock {
    path: PathBuf,
}

impl OutputLock {
    pub fn acquire(output_dir: &Path) -> Result<Self, BuildError> {
        let path = lock_path(output_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::resource(parent, e))?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id()).ok();
                Ok(Self { path })
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(BuildError::resource(
                &path,
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "another build holds the output lock",
                ),
            )),
            Err(err) => Err(BuildError::resource(&path, err)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        fs::remove_file(&self.path).ok();
    }
}

fn lock_path(output_dir: &Path) -> PathBuf {
    let mut name: OsString = output_dir.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

// ============================================================================
// Staging
// ============================================================================

/// Artifacts written to temporary locations, ready to publish.
pub struct Staged {
    dir: TempDir,
    /// Paths relative to the output directory.
    inside: Vec<PathBuf>,
    outside: Vec<(NamedTempFile, PathBuf)>,
}

impl Staged {
    pub fn len(&self) -> usize {
        self.inside.len() + self.outside.len()
    }
}

/// Write every artifact to its staging location.
pub fn stage(output_dir: &Path, artifacts: &OutputSet) -> Result<Staged, BuildError> {
    let parent = output_dir.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| BuildError::resource(parent, e))?;

    let dir = tempfile::Builder::new()
        .prefix(".razorpack-")
        .tempdir_in(parent)
        .map_err(|e| BuildError::resource(parent, e))?;
    // replace mode publishes the staging directory itself
    if let Some(perms) = publish_permissions(output_dir, 0o755) {
        fs::set_permissions(dir.path(), perms).map_err(|e| BuildError::resource(dir.path(), e))?;
    }

    let output_dir = normalize_lexically(output_dir);
    let mut inside = Vec::new();
    let mut outside = Vec::new();

    for artifact in artifacts.iter() {
        let target = normalize_lexically(&output_dir.join(&artifact.file_name));
        if is_within(&output_dir, &target) && target != output_dir {
            let rel = target
                .strip_prefix(&output_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(&artifact.file_name));
            let staged = dir.path().join(&rel);
            write_file(&staged, &artifact.bytes)?;
            inside.push(rel);
        } else {
            let target_parent = target.parent().unwrap_or(Path::new("."));
            fs::create_dir_all(target_parent).map_err(|e| BuildError::resource(target_parent, e))?;
            let mut tmp =
                NamedTempFile::new_in(target_parent).map_err(|e| BuildError::resource(&target, e))?;
            tmp.write_all(&artifact.bytes)
                .map_err(|e| BuildError::resource(&target, e))?;
            if let Some(perms) = publish_permissions(&target, 0o644) {
                tmp.as_file()
                    .set_permissions(perms)
                    .map_err(|e| BuildError::resource(&target, e))?;
            }
            outside.push((tmp, target));
        }
    }

    Ok(Staged {
        dir,
        inside,
        outside,
    })
}

/// Permissions for a file or directory about to be renamed onto `target`:
/// those of the current `target`, else `mode`. Temporary files are created
/// owner-only.
fn publish_permissions(target: &Path, mode: u32) -> Option<fs::Permissions> {
    match fs::metadata(target) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(mode),
    }
}

#[cfg(unix)]
fn default_permissions(mode: u32) -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn default_permissions(_mode: u32) -> Option<fs::Permissions> {
    None
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::resource(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| BuildError::resource(path, e))
}

// ============================================================================
// Publishing
// ============================================================================

/// Move staged artifacts into place.
///
/// With `replace`, the output directory is swapped for the staging directory
/// as a whole; otherwise each file is renamed over its predecessor.
pub fn publish(staged: Staged, output_dir: &Path, options: PublishOptions) -> Result<(), BuildError> {
    let Staged {
        dir,
        inside,
        outside,
    } = staged;

    if options.replace {
        replace_dir(dir.path(), output_dir, &inside, options.verbose)?;
    } else {
        for rel in &inside {
            let target = output_dir.join(rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::resource(parent, e))?;
            }
            fs::rename(dir.path().join(rel), &target).map_err(|e| BuildError::resource(&target, e))?;
        }
    }

    for (tmp, target) in outside {
        tmp.persist(&target)
            .map_err(|e| BuildError::resource(&target, e.error))?;
    }
    Ok(())
}

/// Swap `output_dir` for `staging`, removing the previous contents last.
fn replace_dir(
    staging: &Path,
    output_dir: &Path,
    fresh: &[PathBuf],
    verbose: bool,
) -> Result<(), BuildError> {
    if !output_dir.exists() {
        return fs::rename(staging, output_dir).map_err(|e| BuildError::resource(output_dir, e));
    }

    if verbose {
        let fresh: FxHashSet<&Path> = fresh.iter().map(PathBuf::as_path).collect();
        for stale in list_files(output_dir) {
            if !fresh.contains(stale.as_path()) {
                log!("clean"; "removing {}", stale.display());
            }
        }
    }

    let mut backup: OsString = output_dir.as_os_str().to_owned();
    backup.push(".old");
    let backup = PathBuf::from(backup);
    if backup.exists() {
        fs::remove_dir_all(&backup).map_err(|e| BuildError::resource(&backup, e))?;
    }

    fs::rename(output_dir, &backup).map_err(|e| BuildError::resource(output_dir, e))?;
    if let Err(err) = fs::rename(staging, output_dir) {
        fs::rename(&backup, output_dir).ok();
        return Err(BuildError::resource(output_dir, err));
    }
    fs::remove_dir_all(&backup).map_err(|e| BuildError::resource(&backup, e))
}

/// Files under `dir`, relative to it.
fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = jwalk::WalkDir::new(dir)
        .skip_hidden(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Artifact, ArtifactKind};
    use tempfile::TempDir;

    fn artifact(name: &str, bytes: &str) -> Artifact {
        Artifact {
            file_name: name.into(),
            logical_name: name.into(),
            kind: ArtifactKind::Generated,
            chunk: None,
            bytes: bytes.as_bytes().to_vec(),
        }
    }

    fn outputs(names: &[(&str, &str)]) -> OutputSet {
        let mut set = OutputSet::new();
        for (name, bytes) in names {
            set.push(artifact(name, bytes));
        }
        set
    }

    #[test]
    fn test_lock_is_exclusive_and_released() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("dist");

        let lock = OutputLock::acquire(&output).unwrap();
        assert!(root.path().join("dist.lock").is_file());
        let err = OutputLock::acquire(&output).unwrap_err();
        assert!(matches!(err, BuildError::Resource { source, .. } if source.kind() == io::ErrorKind::AlreadyExists));

        drop(lock);
        assert!(!root.path().join("dist.lock").exists());
        assert!(OutputLock::acquire(&output).is_ok());
    }

    #[test]
    fn test_stage_writes_nothing_visible() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("dist");
        let set = outputs(&[("a.js", "a"), ("img/b.png", "b"), ("../Views/_Layout.cshtml", "<html>")]);

        let staged = stage(&output, &set).unwrap();
        assert_eq!(staged.len(), 3);
        assert!(!output.exists());
        assert!(!root.path().join("Views/_Layout.cshtml").exists());

        publish(staged, &output, PublishOptions::default()).unwrap();
        assert_eq!(fs::read_to_string(output.join("a.js")).unwrap(), "a");
        assert_eq!(fs::read_to_string(output.join("img/b.png")).unwrap(), "b");
        assert_eq!(
            fs::read_to_string(root.path().join("Views/_Layout.cshtml")).unwrap(),
            "<html>"
        );
    }

    #[test]
    fn test_dropped_staging_leaves_no_trace() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("dist");
        let staged = stage(&output, &outputs(&[("a.js", "a"), ("../x.html", "x")])).unwrap();
        drop(staged);

        let leftovers: Vec<_> = fs::read_dir(root.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_merge_keeps_stale_files_replace_removes_them() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("dist");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("old.js"), "old").unwrap();

        let staged = stage(&output, &outputs(&[("new.js", "new")])).unwrap();
        publish(staged, &output, PublishOptions::default()).unwrap();
        assert!(output.join("old.js").exists());
        assert!(output.join("new.js").exists());

        let staged = stage(&output, &outputs(&[("newer.js", "newer")])).unwrap();
        let options = PublishOptions {
            replace: true,
            verbose: true,
        };
        publish(staged, &output, options).unwrap();
        assert_eq!(list_files(&output), [PathBuf::from("newer.js")]);
        assert!(!root.path().join("dist.old").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_published_files_are_not_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;

        let root = TempDir::new().unwrap();
        let output = root.path().join("dist");
        let layout = root.path().join("Views/_Layout.cshtml");
        let set = outputs(&[("a.js", "a"), ("../Views/_Layout.cshtml", "<html>")]);
        let options = PublishOptions {
            replace: true,
            verbose: false,
        };

        publish(stage(&output, &set).unwrap(), &output, options).unwrap();
        assert_eq!(mode(&output), 0o755);
        assert_eq!(mode(&layout), 0o644);

        // an existing page keeps its mode
        fs::set_permissions(&layout, fs::Permissions::from_mode(0o664)).unwrap();
        publish(stage(&output, &set).unwrap(), &output, options).unwrap();
        assert_eq!(mode(&layout), 0o664);
        assert_eq!(fs::read_to_string(&layout).unwrap(), "<html>");
    }
}
