//! Build state machine and cancellation.
//!
//! ```text
//! Idle → ConfigResolved → AssetsClassified → AssetsTransformed → Optimized → Emitted → Done
//!   └──────────────┴──────────────┴─────── any ───────┴────────────┴──────────┴──→ Failed
//! ```
//!
//! No state is ever retried; a failed build must be re-invoked.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    ConfigResolved,
    AssetsClassified,
    AssetsTransformed,
    Optimized,
    Emitted,
    Done,
    Failed,
}

impl BuildState {
    /// The successor on the success path.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::ConfigResolved),
            Self::ConfigResolved => Some(Self::AssetsClassified),
            Self::AssetsClassified => Some(Self::AssetsTransformed),
            Self::AssetsTransformed => Some(Self::Optimized),
            Self::Optimized => Some(Self::Emitted),
            Self::Emitted => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `self → to` is a legal transition.
    pub fn can_advance_to(self, to: Self) -> bool {
        match to {
            Self::Failed => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ConfigResolved => "config-resolved",
            Self::AssetsClassified => "assets-classified",
            Self::AssetsTransformed => "assets-transformed",
            Self::Optimized => "optimized",
            Self::Emitted => "emitted",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Shared cancellation flag, checked between asset-processing units.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// The first Ctrl+C requests cancellation; the build stops at the next asset
/// boundary and discards its staged output. A second one exits immediately.
pub fn setup_shutdown_handler(flag: CancelFlag) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        if flag.is_cancelled() {
            std::process::exit(130);
        }
        crate::log!("build"; "cancelling...");
        flag.cancel();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}
