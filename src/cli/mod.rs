//! Command-line interface module.

mod args;
pub mod build;
pub mod inspect;

pub use args::{BuildArgs, Cli, Commands, ConfigArgs, InspectArgs};

use crate::config::{PackConfig, find_config_file};
use crate::debug;
use anyhow::{Context, Result};
use clap::ColorChoice;

/// Locate the config file from the current directory and load it.
pub fn load_config(cli: &Cli, args: &ConfigArgs) -> Result<PackConfig> {
    let cwd = std::env::current_dir().context("cannot read the current directory")?;
    let path = find_config_file(&cwd, &cli.config).with_context(|| {
        format!(
            "cannot find `{}` in `{}` or any parent directory",
            cli.config.display(),
            cwd.display()
        )
    })?;

    let config = PackConfig::load(&path, args.overlay.as_deref(), args.mode)?;
    debug!("config"; "loaded `{}` ({} mode)", path.display(), config.mode);
    if let Some(overlay) = &config.overlay_path {
        debug!("config"; "overlay `{}`", overlay.display());
    }

    apply_colors(cli.color, config.stats.colors);
    Ok(config)
}

/// `--color` wins; with `auto` the config's `stats.colors` decides, then the TTY.
pub fn apply_colors(choice: ColorChoice, configured: Option<bool>) {
    match choice {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {
            if let Some(enabled) = configured {
                owo_colors::set_override(enabled);
            }
        }
    }
}
