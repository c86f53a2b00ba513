//! Build errors.

use crate::bundle::RenderError;
use crate::config::ConfigError;
use crate::core::BuildState;
use crate::plugin::LifecyclePoint;
use crate::resolve::ResolveError;
use crate::utils::plural_count;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Asset errors
// ============================================================================

/// Failure of one source asset. Other assets are still processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetError {
    /// Root-relative path of the asset.
    pub path: String,
    /// Failing stage; `None` when the asset was rejected before any stage ran.
    pub stage: Option<String>,
    pub message: String,
}

impl AssetError {
    pub fn stage(path: impl Into<String>, stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stage: Some(stage.into()),
            message: message.into(),
        }
    }

    pub fn unmatched(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stage: None,
            message: "no rule matches (strict mode)".into(),
        }
    }

    /// One-line detail: `typescript: unexpected token`.
    pub fn detail(&self) -> String {
        match &self.stage {
            Some(stage) => format!("{stage}: {}", self.message),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.path, self.detail())
    }
}

impl std::error::Error for AssetError {}

/// All asset failures of a build, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetErrors(Vec<AssetError>);

impl AssetErrors {
    pub fn new(mut errors: Vec<AssetError>) -> Self {
        errors.sort_by(|a, b| a.path.cmp(&b.path));
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetError> {
        self.0.iter()
    }
}

impl fmt::Display for AssetErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", plural_count(self.0.len(), "asset"))?;
        for err in &self.0 {
            write!(f, "\n- {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AssetErrors {}

// ============================================================================
// BuildError
// ============================================================================

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Assets(AssetErrors),

    #[error("plugin `{plugin}` failed during {point}")]
    Plugin {
        plugin: &'static str,
        point: LifecyclePoint,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot access `{}`", .path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("cannot start the worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("build cancelled")]
    Cancelled,

    #[error("illegal state transition {from} → {to}")]
    State { from: BuildState, to: BuildState },
}

impl BuildError {
    pub fn resource(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Resource {
            path: path.into(),
            source,
        }
    }
}

impl From<ResolveError> for BuildError {
    fn from(err: ResolveError) -> Self {
        let request = err.request.clone();
        Self::resource(request, io::Error::new(io::ErrorKind::NotFound, err.to_string()))
    }
}
