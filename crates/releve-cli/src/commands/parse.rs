//! Parse command - reconstruct one statement from a local file.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;
use rust_decimal::Decimal;
use tracing::{debug, info};

use releve_core::models::{ReleveConfig, Statement, Word};
use releve_core::pdf::StatementPdf;
use releve_core::statement::{StatementParser, group_words};

use super::load_config;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input file: a statement PDF or a positioned-word JSON dump
    #[arg(required = true)]
    input: PathBuf,

    /// Client name the statement belongs to
    #[arg(short = 'n', long)]
    client: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV ledger rows
    Csv,
    /// Plain text summary
    Text,
}

/// Build a parser from the config's tolerances.
pub fn build_parser(config: &ReleveConfig) -> StatementParser {
    let tolerance =
        Decimal::try_from(config.parse.balance_tolerance).unwrap_or_else(|_| Decimal::new(1, 2));
    StatementParser::new()
        .with_tolerance(tolerance)
        .with_max_product_numbers(config.parse.max_product_numbers)
}

pub fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    info!("Parsing statement file: {}", args.input.display());

    let lines = match extension.as_str() {
        "pdf" => {
            let data = fs::read(&args.input)?;
            let pdf = StatementPdf::from_bytes(&data)?;
            debug!("PDF has {} pages", pdf.page_count());
            pdf.raw_lines()?
        }
        "json" => {
            let content = fs::read_to_string(&args.input)?;
            let words: Vec<Word> =
                serde_json::from_str(&content).context("reading word dump")?;
            group_words(&words)
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    let parser = build_parser(&config);
    let statement = parser.parse(&lines, &args.client)?;

    for warning in &statement.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }
    if statement.reconciled == Some(false) {
        eprintln!(
            "{} statement does not reconcile against its printed balance",
            style("⚠").yellow()
        );
    }

    let output = format_statement(&statement, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn format_statement(statement: &Statement, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(statement)?),
        OutputFormat::Csv => format_csv(statement),
        OutputFormat::Text => Ok(format_text(statement)),
    }
}

pub fn format_csv(statement: &Statement) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "client",
        "date",
        "reference",
        "kind",
        "product",
        "quantity",
        "unit_price",
        "discount",
        "discounted_unit_price",
        "amount",
        "running_balance",
    ])?;

    for record in &statement.records {
        wtr.write_record([
            record.client_name.as_str(),
            &record.date.to_string(),
            record.reference.as_deref().unwrap_or(""),
            record.kind.as_str(),
            record.product.as_deref().unwrap_or(""),
            &record.quantity.map(|q| q.to_string()).unwrap_or_default(),
            &record
                .unit_price
                .map(|d| d.to_string())
                .unwrap_or_default(),
            &record.discount.map(|d| d.to_string()).unwrap_or_default(),
            &record
                .discounted_unit_price
                .map(|d| d.to_string())
                .unwrap_or_default(),
            &record.amount.to_string(),
            &record.running_balance.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(statement: &Statement) -> String {
    let mut output = String::new();

    output.push_str(&format!("Statement: {}\n", statement.client_name));
    output.push_str(&format!("Rows: {}\n", statement.records.len()));
    output.push_str("\n");

    for record in &statement.records {
        let label = record
            .product
            .as_deref()
            .or(record.reference.as_deref())
            .unwrap_or(record.kind.as_str());
        output.push_str(&format!(
            "  {}  {:<12}  {:<40}  {:>10}  {:>10}\n",
            record.date,
            record.kind.as_str(),
            label,
            record.amount,
            record.running_balance,
        ));
    }

    output.push_str("\n");
    output.push_str(&format!("Initial balance:  {}\n", statement.initial_balance));
    output.push_str(&format!(
        "Computed balance: {}\n",
        statement.computed_final_balance
    ));
    if let Some(declared) = statement.declared_final_balance {
        output.push_str(&format!("Declared balance: {}\n", declared));
        let verdict = match statement.reconciled {
            Some(true) => "reconciled",
            Some(false) => "MISMATCH",
            None => "unknown",
        };
        output.push_str(&format!("Reconciliation:   {}\n", verdict));
    }

    output
}
