//! `razorpack build`.

use super::{BuildArgs, Cli, load_config};
use crate::bundle::{Artifact, OutputSet};
use crate::core::CancelFlag;
use crate::log;
use crate::logger::print_failures;
use crate::pipeline::{self, BuildError, BuildOptions};
use crate::utils::plural_count;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::error::Error;
use std::process::ExitCode;
use std::time::Instant;

/// Run one build. Build failures are reported here and turn into a
/// non-zero exit code; only CLI-level failures are returned as errors.
pub fn run_build(cli: &Cli, args: &BuildArgs, cancel: CancelFlag) -> Result<ExitCode> {
    let config = load_config(cli, &args.config)?;
    let options = BuildOptions {
        workers: args.workers,
        strict: args.strict,
        quiet: args.quiet,
    };

    let started = Instant::now();
    if !args.quiet {
        log!("build"; "{} build into `{}`", config.mode, config.output.path.display());
    }

    match pipeline::build(&config, &options, cancel) {
        Ok(report) => {
            if config.stats.assets && !args.quiet {
                print_assets(&report.artifacts);
            }
            log!(
                "done";
                "{} from {} in {:.2?}",
                plural_count(report.artifacts.len(), "file"),
                plural_count(report.modules, "module"),
                started.elapsed()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report_failure(&err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_failure(err: &BuildError) {
    match err {
        BuildError::Assets(errors) => {
            log!("error"; "{} failed, nothing was written", plural_count(errors.len(), "asset"));
            let lines: Vec<(String, String)> =
                errors.iter().map(|e| (e.path.clone(), e.detail())).collect();
            print_failures(lines.iter().map(|(path, detail)| (path.as_str(), detail.as_str())));
        }
        BuildError::Cancelled => log!("error"; "build cancelled, nothing was written"),
        other => {
            log!("error"; "{other}");
            let mut causes = Vec::new();
            let mut source = other.source();
            while let Some(cause) = source {
                causes.push(cause.to_string());
                source = cause.source();
            }
            if !causes.is_empty() {
                let detail = causes.join("\n");
                print_failures([("caused by", detail.as_str())]);
            }
        }
    }
}

// ============================================================================
// Asset table
// ============================================================================

fn print_assets(artifacts: &OutputSet) {
    let width = artifacts.iter().map(|a| a.file_name.len()).max().unwrap_or(0);
    for artifact in artifacts.iter() {
        println!("{}", asset_row(artifact, width));
    }
    println!(
        "  {:width$}  {:>9}",
        "total".bold(),
        format_size(artifacts.total_size()),
    );
}

fn asset_row(artifact: &Artifact, width: usize) -> String {
    format!(
        "  {:width$}  {:>9}  {}",
        artifact.file_name,
        format_size(artifact.bytes.len()),
        artifact.chunk.as_deref().unwrap_or(artifact.kind.name()).dimmed(),
    )
}

fn format_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let size = bytes as f64;
    if size < KIB {
        format!("{bytes} B")
    } else if size < KIB * KIB {
        format!("{:.1} KiB", size / KIB)
    } else {
        format!("{:.1} MiB", size / (KIB * KIB))
    }
}
