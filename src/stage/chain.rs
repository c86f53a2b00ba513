//! Ordered stage execution.

use super::{Asset, Stage, StageContext, StageError};
use crate::core::ModuleKind;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One resolved entry of a rule's `use` list.
#[derive(Clone)]
struct Link {
    stage: Arc<dyn Stage>,
    options: Value,
}

/// Stages of one rule, in application order.
#[derive(Clone, Default)]
pub struct StageChain {
    links: Vec<Link>,
}

/// The stage that failed and why.
#[derive(Debug, Clone, Error)]
#[error("{stage}: {error}")]
pub struct StageFailure {
    pub stage: &'static str,
    #[source]
    pub error: StageError,
}

impl StageChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Arc<dyn Stage>, options: Value) {
        self.links.push(Link { stage, options });
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.links.iter().map(|l| l.stage.name())
    }

    /// Kind declared by the last stage that declares one.
    pub fn produced_kind(&self) -> Option<ModuleKind> {
        self.links.iter().rev().find_map(|l| l.stage.produces())
    }

    /// Apply every stage in order. The first failure stops the chain.
    pub fn execute(&self, asset: Asset, source_maps: bool) -> Result<Asset, StageFailure> {
        self.links.iter().try_fold(asset, |asset, link| {
            let cx = StageContext {
                options: &link.options,
                source_maps,
            };
            link.stage.apply(asset, &cx).map_err(|error| StageFailure {
                stage: link.stage.name(),
                error,
            })
        })
    }
}

impl fmt::Debug for StageChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
