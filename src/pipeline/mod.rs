//! Build driver.
//!
//! One build walks the state machine in [`crate::core::BuildState`]:
//!
//! ```text
//! validate config ─► lock output ─► PreBuild ─► ResolveConfig        ConfigResolved
//! resolve entries ─► classify                                      AssetsClassified
//! transform (rayon pool) ─► module graph ─► attach provided        AssetsTransformed
//! Optimize                                                          Optimized
//! render ─► Emit ─► stage ─► publish                               Emitted → Done
//! ```
//!
//! Any error moves the build to `Failed`. Nothing is published unless every
//! step before publishing succeeded.

mod context;
mod emit;
mod error;
mod transform;

pub use context::BuildContext;
pub use error::{AssetError, BuildError};

use crate::bundle::{Module, ModuleGraph, OutputSet, render};
use crate::config::{OutputFormat, PackConfig};
use crate::core::{BuildState, CancelFlag, ModuleKind};
use crate::logger::ProgressLine;
use crate::plugin::{LifecyclePoint, PluginSet};
use crate::resolve::{Resolved, ResolvedEntry, Resolver};
use crate::rule::RuleTable;
use crate::stage::StageRegistry;
use crate::utils::plural_count;
use crate::{debug, log};
use emit::OutputLock;
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use transform::{Classified, TransformEnv, Unit};

// =============================================================================
// Types
// =============================================================================

/// Command-line overrides for one build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Worker threads (overrides `parallelism`).
    pub workers: Option<usize>,
    /// Reject assets no rule matches (in addition to `module.strict`).
    pub strict: bool,
    /// No progress line or phase logs.
    pub quiet: bool,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub artifacts: OutputSet,
    pub modules: usize,
    pub chunks: usize,
}

// =============================================================================
// Driver
// =============================================================================

/// Build with the built-in stages and the configured plugins.
pub fn build(
    config: &PackConfig,
    options: &BuildOptions,
    cancel: CancelFlag,
) -> Result<BuildReport, BuildError> {
    let registry = StageRegistry::builtin();
    let plugins = PluginSet::from_config(config);
    build_with(config, options, cancel, &registry, &plugins)
}

/// Build with an explicit stage registry and plugin set.
pub fn build_with(
    config: &PackConfig,
    options: &BuildOptions,
    cancel: CancelFlag,
    registry: &StageRegistry,
    plugins: &PluginSet,
) -> Result<BuildReport, BuildError> {
    let mut ctx = BuildContext::new(config, cancel);
    run(&mut ctx, options, registry, plugins).inspect_err(|_| {
        let reached = ctx.state();
        ctx.fail();
        debug!("build"; "failed after {}", reached);
    })
}

fn run(
    ctx: &mut BuildContext<'_>,
    options: &BuildOptions,
    registry: &StageRegistry,
    plugins: &PluginSet,
) -> Result<BuildReport, BuildError> {
    let config = ctx.config;

    // Configuration
    let mut diag = config.validate();
    let mut table = RuleTable::compile(&config.module, registry, &mut diag);
    diag.into_result()?;
    if options.strict {
        table.set_strict(true);
    }

    let output_dir = config.output_dir();
    let _lock = OutputLock::acquire(&output_dir)?;

    plugins.run(LifecyclePoint::PreBuild, ctx)?;
    plugins.run(LifecyclePoint::ResolveConfig, ctx)?;
    ctx.advance(BuildState::ConfigResolved)?;

    // Classification
    let entries = Resolver::new(config).resolve_entries(&config.entry)?;
    let requests = collect_requests(&entries, &ctx.extra_requests);
    let Classified { units, rejected } = transform::classify(requests, &table);
    ctx.advance(BuildState::AssetsClassified)?;

    // Transformation
    ctx.check_cancelled()?;
    if !options.quiet {
        log!("build"; "{} in {}", plural_count(units.len(), "asset"), plural_count(entries.len(), "entry"));
    }
    let modules = transform_units(ctx, &units, rejected, options)?;
    let with_runtime = config.output.format == OutputFormat::Modules;
    ctx.graph = ModuleGraph::from_entries(&entries, modules, with_runtime);
    ctx.graph.attach_provided(&ctx.provides);
    ctx.advance(BuildState::AssetsTransformed)?;

    plugins.run(LifecyclePoint::Optimize, ctx)?;
    ctx.advance(BuildState::Optimized)?;

    // Emission
    ctx.artifacts = render(&ctx.graph, &ctx.provides, config)?;
    plugins.run(LifecyclePoint::Emit, ctx)?;

    ctx.check_cancelled()?;
    let staged = emit::stage(&output_dir, &ctx.artifacts)?;
    ctx.check_cancelled()?;
    debug!("emit"; "publishing {}", plural_count(staged.len(), "file"));
    emit::publish(staged, &output_dir, ctx.publish)?;
    ctx.advance(BuildState::Emitted)?;
    ctx.advance(BuildState::Done)?;

    Ok(BuildReport {
        output_dir,
        artifacts: std::mem::take(&mut ctx.artifacts),
        modules: ctx.graph.modules().len(),
        chunks: ctx.graph.chunks.len(),
    })
}

/// Entry requests then on-demand requests, each module once.
fn collect_requests(entries: &[ResolvedEntry], extra: &[Resolved]) -> Vec<Resolved> {
    let mut seen = FxHashSet::default();
    entries
        .iter()
        .flat_map(|entry| entry.requests.iter())
        .chain(extra)
        .filter(|request| seen.insert(request.key()))
        .cloned()
        .collect()
}

fn transform_units(
    ctx: &BuildContext<'_>,
    units: &[Unit<'_>],
    rejected: Vec<AssetError>,
    options: &BuildOptions,
) -> Result<Vec<Module>, BuildError> {
    let workers = options.workers.or(ctx.config.parallelism).unwrap_or(0);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("razorpack-worker-{i}"))
        .build()?;

    let progress = (!options.quiet).then(|| {
        let count = |kind: ModuleKind| units.iter().filter(|u| u.kind() == kind).count();
        ProgressLine::new(&[
            (ModuleKind::Script.name(), count(ModuleKind::Script)),
            (ModuleKind::Style.name(), count(ModuleKind::Style)),
            (ModuleKind::File.name(), count(ModuleKind::File)),
        ])
    });

    let env = TransformEnv {
        defines: &ctx.defines,
        source_maps: ctx.config.devtool.enabled(),
        cancel: &ctx.cancel,
        progress: progress.as_ref(),
    };
    let modules = transform::transform_all(units, rejected, &env, &pool);

    if let Some(progress) = progress {
        progress.finish();
    }
    modules
}
