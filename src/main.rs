//! Razorpack - an asset pipeline for server-rendered web applications.

#![allow(dead_code)]

mod bundle;
mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod pipeline;
mod plugin;
mod resolve;
mod rule;
mod stage;
mod utils;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use core::CancelFlag;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set global color override based on CLI option (config may refine `auto`)
    cli::apply_colors(cli.color, None);
    logger::set_verbose(cli.verbose);

    // Setup global Ctrl+C handler (before any blocking operations)
    let cancel = CancelFlag::new();
    core::setup_shutdown_handler(cancel.clone())?;

    match &cli.command {
        Commands::Build { args } => cli::build::run_build(&cli, args, cancel),
        Commands::Inspect { args } => cli::inspect::run_inspect(&cli, args),
    }
}
