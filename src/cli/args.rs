//! Command-line interface definitions.

use crate::core::BuildMode;
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Razorpack asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = "razorpack.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print per-asset and per-phase debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Transform assets and write hashed bundles
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Print the effective configuration and the rules matching paths
    #[command(visible_alias = "i")]
    Inspect {
        #[command(flatten)]
        args: InspectArgs,
    },
}

/// Mode and overlay selection shared by all commands.
#[derive(clap::Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Build mode (default: RAZORPACK_MODE, NODE_ENV, `mode` key, production)
    #[arg(short, long, value_enum)]
    pub mode: Option<BuildMode>,

    /// Overlay merged on top of the config (default: razorpack.<mode>.toml)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub overlay: Option<PathBuf>,
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Worker threads for asset transformation (default: available cores)
    #[arg(short, long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Fail on assets that no rule matches
    #[arg(long)]
    pub strict: bool,

    /// No progress line or asset table
    #[arg(short, long)]
    pub quiet: bool,
}

/// Inspect command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Root-relative asset paths to classify against the rule table
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
}

fn parse_workers(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
