//! CLI subcommands.

pub mod batch;
pub mod clients;
pub mod config;
pub mod parse;

use std::path::Path;

use releve_core::models::ReleveConfig;

/// Load the config file when given, defaults otherwise.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ReleveConfig> {
    match config_path {
        Some(path) => Ok(ReleveConfig::from_file(Path::new(path))?),
        None => Ok(ReleveConfig::default()),
    }
}
