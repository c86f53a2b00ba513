//! Entry and request resolution.
//!
//! A request resolves, in order:
//!
//! 1. `[externals]` name → [`Resolved::External`]
//! 2. path relative to the project root: as is, then with each
//!    `resolve.extensions` suffix, then `<dir>/index<ext>`
//! 3. the same probing under each `resolve.modules` directory, where a
//!    directory's `package.json` `main` field is honored

mod template;

pub use template::{TemplateError, Tokens, resolve_output_path};

use crate::config::{Entries, PackConfig};
use crate::utils::path::{normalize_lexically, relative_key};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A source file (absolute path) and its root-relative key.
    File { path: PathBuf, key: String },
    /// Satisfied at runtime by a global expression.
    External { request: String, global: String },
}

impl Resolved {
    /// Identity of the module this request becomes.
    pub fn key(&self) -> String {
        match self {
            Self::File { key, .. } => key.clone(),
            Self::External { request, .. } => format!("external:{request}"),
        }
    }
}

/// An entry's logical name and its resolved requests, in declaration order.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub name: String,
    pub requests: Vec<Resolved>,
}

#[derive(Debug, Error)]
#[error("cannot resolve `{request}`{}", entry_suffix(.entry))]
pub struct ResolveError {
    pub request: String,
    pub entry: Option<String>,
    /// Candidates probed, for `--verbose` output.
    pub tried: Vec<PathBuf>,
}

fn entry_suffix(entry: &Option<String>) -> String {
    entry
        .as_ref()
        .map(|e| format!(" (entry `{e}`)"))
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    root: &'a Path,
    extensions: &'a [String],
    modules: &'a [PathBuf],
    externals: &'a BTreeMap<String, String>,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a PackConfig) -> Self {
        Self {
            root: &config.root,
            extensions: &config.resolve.extensions,
            modules: &config.resolve.modules,
            externals: &config.externals,
        }
    }

    pub fn resolve(&self, request: &str) -> Result<Resolved, ResolveError> {
        if let Some(global) = self.externals.get(request) {
            return Ok(Resolved::External {
                request: request.to_string(),
                global: global.clone(),
            });
        }

        let mut tried = Vec::new();
        let relative = request.trim_start_matches("./");
        let bases = std::iter::once(self.root.join(relative))
            .chain(self.modules.iter().map(|dir| self.root.join(dir).join(relative)));

        for base in bases {
            if let Some(path) = self.probe(&base, &mut tried) {
                let path = normalize_lexically(&path);
                let key = relative_key(self.root, &path);
                return Ok(Resolved::File { path, key });
            }
        }

        Err(ResolveError {
            request: request.to_string(),
            entry: None,
            tried,
        })
    }

    /// Resolve every entry, keeping declaration order.
    pub fn resolve_entries(&self, entries: &Entries) -> Result<Vec<ResolvedEntry>, ResolveError> {
        entries
            .iter()
            .map(|(name, request)| {
                let requests = request
                    .requests()
                    .iter()
                    .map(|r| {
                        self.resolve(r).map_err(|mut e| {
                            e.entry = Some(name.to_string());
                            e
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolvedEntry {
                    name: name.to_string(),
                    requests,
                })
            })
            .collect()
    }

    /// File candidates for `base`: itself, `base<ext>`, then directory lookups.
    fn probe(&self, base: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
        tried.push(base.to_path_buf());
        if base.is_file() {
            return Some(base.to_path_buf());
        }

        for ext in self.extensions {
            let candidate = with_suffix(base, ext);
            tried.push(candidate.clone());
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if base.is_dir() {
            if let Some(main) = package_main(base) {
                let main = base.join(main);
                // `"main": "."` would loop back into this directory
                if normalize_lexically(&main) != normalize_lexically(base) {
                    if let Some(found) = self.probe(&main, tried) {
                        return Some(found);
                    }
                }
            }
            for ext in self.extensions {
                let candidate = with_suffix(&base.join("index"), ext);
                tried.push(candidate.clone());
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        None
    }
}

/// `src/index` + `.ts` → `src/index.ts` (no extension replacement).
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = base.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

#[derive(Deserialize)]
struct PackageJson {
    main: Option<String>,
}

/// `main` field of `<dir>/package.json`, if readable.
fn package_main(dir: &Path) -> Option<String> {
    let content = fs::read_to_string(dir.join("package.json")).ok()?;
    serde_json::from_str::<PackageJson>(&content)
        .ok()?
        .main
        .filter(|m| !m.is_empty())
}
