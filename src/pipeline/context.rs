//! Explicit state threaded through one build.

use super::error::BuildError;
use crate::bundle::{Definitions, ModuleGraph, OutputSet, ProvideBinding};
use crate::config::PackConfig;
use crate::core::{BuildState, CancelFlag};
use crate::resolve::Resolved;

/// How staged artifacts are moved into the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Replace the whole output directory (stale files disappear).
    pub replace: bool,
    /// Log every stale file removed.
    pub verbose: bool,
}

/// Everything plugins and build phases share.
///
/// Owned by the driver; plugins receive `&mut` access at their lifecycle
/// points and nothing else.
pub struct BuildContext<'a> {
    pub config: &'a PackConfig,
    pub cancel: CancelFlag,
    state: BuildState,
    /// `define` table applied to script modules after their stage chain.
    pub defines: Definitions,
    /// `provide` bindings applied when rendering.
    pub provides: Vec<ProvideBinding>,
    /// Requests bundled on demand rather than listed by an entry.
    pub extra_requests: Vec<Resolved>,
    pub graph: ModuleGraph,
    pub artifacts: OutputSet,
    pub publish: PublishOptions,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a PackConfig, cancel: CancelFlag) -> Self {
        Self {
            config,
            cancel,
            state: BuildState::Idle,
            defines: Definitions::default(),
            provides: Vec::new(),
            extra_requests: Vec::new(),
            graph: ModuleGraph::new(),
            artifacts: OutputSet::new(),
            publish: PublishOptions::default(),
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Move to `to`, rejecting anything but the next step (or `Failed`).
    pub fn advance(&mut self, to: BuildState) -> Result<(), BuildError> {
        if !self.state.can_advance_to(to) {
            return Err(BuildError::State {
                from: self.state,
                to,
            });
        }
        crate::debug!("build"; "{} → {}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Mark the build failed. No-op once terminal.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = BuildState::Failed;
        }
    }

    pub fn check_cancelled(&self) -> Result<(), BuildError> {
        if self.cancel.is_cancelled() {
            Err(BuildError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Queue a request for bundling unless it is already queued.
    pub fn add_request(&mut self, request: Resolved) {
        if !self.extra_requests.contains(&request) {
            self.extra_requests.push(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_advance_rejects_skips() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("entry = \"a.js\"\n", dir.path());
        let mut ctx = BuildContext::new(&config, CancelFlag::new());

        ctx.advance(BuildState::ConfigResolved).unwrap();
        let err = ctx.advance(BuildState::Optimized).unwrap_err();
        assert!(matches!(
            err,
            BuildError::State {
                from: BuildState::ConfigResolved,
                to: BuildState::Optimized
            }
        ));

        ctx.fail();
        assert_eq!(ctx.state(), BuildState::Failed);
        assert!(ctx.advance(BuildState::AssetsClassified).is_err());
    }

    #[test]
    fn test_cancel_is_observed() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("entry = \"a.js\"\n", dir.path());
        let cancel = CancelFlag::new();
        let ctx = BuildContext::new(&config, cancel.clone());
        assert!(ctx.check_cancelled().is_ok());
        cancel.cancel();
        assert!(matches!(ctx.check_cancelled(), Err(BuildError::Cancelled)));
    }
}
