//! Clients command - manage the client directory.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;

use releve_core::models::ClientKey;
use releve_store::StatementStore;

use super::load_config;

/// Arguments for the clients command.
#[derive(Args)]
pub struct ClientsArgs {
    /// Database file (default: from config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Replace the directory with entries from a JSON file
    /// (array of {"name": …, "portal_key": …})
    #[arg(long)]
    import: Option<PathBuf>,

    /// List the known clients
    #[arg(long)]
    list: bool,
}

pub fn run(args: ClientsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let db_path = args.db.unwrap_or_else(|| config.store.db_path.clone());
    let mut store = StatementStore::open(&db_path)?;

    if let Some(path) = &args.import {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let keys: Vec<ClientKey> =
            serde_json::from_str(&content).context("parsing client directory")?;
        store.replace_client_keys(&keys)?;
        println!(
            "{} Imported {} clients into {}",
            style("✓").green(),
            keys.len(),
            db_path.display()
        );
    }

    if args.list || args.import.is_none() {
        let keys = store.client_keys()?;
        if keys.is_empty() {
            println!("{} Client directory is empty", style("ℹ").blue());
        }
        for key in keys {
            println!("{}  {}", key.portal_key, key.name);
        }
    }

    Ok(())
}
