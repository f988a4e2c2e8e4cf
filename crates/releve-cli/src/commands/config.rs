//! Config command - inspect and bootstrap the configuration file.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;

use releve_core::models::ReleveConfig;

use super::load_config;

const DEFAULT_CONFIG_PATH: &str = "releve.json";

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    /// Write a default config file
    #[arg(long)]
    init: bool,

    /// Where to write the config (with --init)
    #[arg(long)]
    path: Option<PathBuf>,
}

pub fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    if args.init {
        let path = args
            .path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        ReleveConfig::default().save(&path)?;
        println!(
            "{} Default config written to {}",
            style("✓").green(),
            path.display()
        );
        return Ok(());
    }

    let config = load_config(config_path)?;
    let source = config_path.unwrap_or("<defaults>");
    println!("{} Configuration from {}", style("ℹ").blue(), source);
    println!("{}", serde_json::to_string_pretty(&config)?);

    // Point at the file the other commands would pick up.
    if config_path.is_none() && Path::new(DEFAULT_CONFIG_PATH).exists() {
        println!();
        println!(
            "{} {} exists but is not loaded; pass it with --config",
            style("⚠").yellow(),
            DEFAULT_CONFIG_PATH
        );
    }

    Ok(())
}
