//! Batch command - fetch, parse and store statements for many clients.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Utc};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use releve_core::pdf::StatementPdf;
use releve_portal::{FetchOptions, PortalClient, fetch_statements};
use releve_store::StatementStore;

use super::{load_config, parse::build_parser};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Database file (default: from config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Process a single client instead of the whole directory
    #[arg(short = 'n', long)]
    client: Option<String>,

    /// First day of the statement range (default: from config)
    #[arg(long)]
    start_date: Option<String>,

    /// Last day of the statement range (default: yesterday)
    #[arg(long)]
    end_date: Option<String>,

    /// Number of parallel downloads
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Wall-clock budget for the whole batch, in seconds
    #[arg(long)]
    budget: Option<u64>,

    /// Portal session cookie (default: RELEVE_SESSION env var)
    #[arg(long)]
    session: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let session = args
        .session
        .or_else(|| std::env::var("RELEVE_SESSION").ok())
        .filter(|s| !s.is_empty());
    let Some(session) = session else {
        anyhow::bail!("portal session required: pass --session or set RELEVE_SESSION");
    };

    let db_path = args.db.unwrap_or_else(|| config.store.db_path.clone());
    let mut store = StatementStore::open(&db_path)?;

    let clients = match &args.client {
        Some(name) => match store.client_key(name)? {
            Some(key) => vec![key],
            None => anyhow::bail!("client '{}' not found in the directory", name),
        },
        None => store.client_keys()?,
    };
    if clients.is_empty() {
        anyhow::bail!(
            "client directory is empty; import it first with 'releve clients --import'"
        );
    }

    let start_date = args
        .start_date
        .unwrap_or_else(|| config.portal.start_date.clone());
    let end_date = args.end_date.unwrap_or_else(|| {
        let yesterday = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap_or_else(|| Utc::now().date_naive());
        yesterday.format("%Y-%m-%d").to_string()
    });

    println!(
        "{} Fetching {} statements ({} → {})",
        style("ℹ").blue(),
        clients.len(),
        start_date,
        end_date
    );

    let portal = Arc::new(PortalClient::new(
        &config.portal.base_url,
        session,
        Duration::from_secs(config.portal.request_timeout_secs),
    )?);
    let options = FetchOptions {
        workers: args.jobs.unwrap_or(config.portal.workers),
        max_retries: config.portal.max_retries,
        retry_base: Duration::from_secs(config.portal.retry_base_secs),
        budget: Duration::from_secs(args.budget.unwrap_or(config.portal.budget_secs)),
        ..FetchOptions::default()
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("downloading {} statements...", clients.len()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let outcomes = fetch_statements(portal, &clients, &start_date, &end_date, &options).await;
    spinner.finish_and_clear();

    // Clients cancelled by the budget never produced an outcome.
    let cancelled: Vec<String> = clients
        .iter()
        .filter(|c| !outcomes.iter().any(|o| o.client.name == c.name))
        .map(|c| c.name.clone())
        .collect();

    let pb = ProgressBar::new(outcomes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} clients")
            .unwrap()
            .progress_chars("=>-"),
    );

    let parser = build_parser(&config);
    let mut saved = 0usize;
    let mut unreconciled: Vec<String> = Vec::new();
    let mut failed: Vec<(String, String)> = Vec::new();

    for outcome in outcomes {
        let name = outcome.client.name.clone();
        match outcome.result {
            Ok(bytes) => match process_statement(&parser, &mut store, &name, &bytes) {
                Ok(reconciled) => {
                    saved += 1;
                    if reconciled == Some(false) {
                        unreconciled.push(name.clone());
                    }
                    info!(client = %name, attempts = outcome.attempts, "statement stored");
                }
                Err(e) => {
                    warn!(client = %name, "processing failed: {e}");
                    failed.push((name, e.to_string()));
                }
            },
            Err(e) => {
                failed.push((name, e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Complete");

    println!();
    println!(
        "{} Stored {} statements ({} failed, {} cancelled)",
        style("✓").green(),
        style(saved).green(),
        style(failed.len()).red(),
        cancelled.len()
    );

    if !unreconciled.is_empty() {
        println!();
        println!(
            "{} {} statements do not reconcile against their printed balance:",
            style("⚠").yellow(),
            unreconciled.len()
        );
        for name in &unreconciled {
            println!("  - {}", name);
        }
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed clients:").red());
        for (name, error) in &failed {
            println!("  - {}: {}", name, error);
        }
    }

    if !cancelled.is_empty() {
        println!();
        println!("{}", style("Cancelled by budget:").yellow());
        for name in &cancelled {
            println!("  - {}", name);
        }
    }

    Ok(())
}

/// Parse one downloaded PDF and store the resulting statement. Returns the
/// reconciliation verdict.
fn process_statement(
    parser: &releve_core::statement::StatementParser,
    store: &mut StatementStore,
    client_name: &str,
    bytes: &[u8],
) -> anyhow::Result<Option<bool>> {
    let pdf = StatementPdf::from_bytes(bytes)?;
    let lines = pdf.raw_lines()?;
    let statement = parser.parse(&lines, client_name)?;

    for warning in &statement.warnings {
        warn!(client = client_name, "{warning}");
    }

    let reconciled = statement.reconciled;
    store.save_statement(&statement)?;
    Ok(reconciled)
}
