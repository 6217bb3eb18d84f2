//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use velomap_core::config::{CliConfigOverrides, LayeredConfig};

use crate::cli::Cli;

const DEFAULT_CONFIG_FILE: &str = "velomap.toml";

/// Defaults, then the config file, then `VELOMAP_*`, then command-line flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    match config_file(cli.config.as_deref()) {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            config = config
                .load_from_file(&path)
                .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
        }
        None => tracing::debug!("No configuration file, using defaults"),
    }

    let mut config = config.load_from_env();
    config.update_from_cli(CliConfigOverrides {
        metric_crs: cli.metric_crs,
        data_dir: cli.data_dir.clone(),
        cache_ttl_minutes: cli.cache_ttl_minutes,
        buffer_quadrant_segments: cli.buffer_quadrant_segments,
        ..Default::default()
    });
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

/// An explicit file must exist; the default one is optional
fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}
