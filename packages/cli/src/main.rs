#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the accident report engine.

mod table;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use crash_reports_accident_models::AccidentRecord;
use crash_reports_dataset::{LoadOptions, load_records};
use crash_reports_report::{ReportError, registry, runner};
use crash_reports_report_models::{ReportName, ReportOutput};

/// Environment variable consulted when `--data` is not given.
const DATA_ENV: &str = "CRASH_REPORTS_DATA";

#[derive(Parser)]
#[command(name = "crash_reports", about = "Aviation accident report engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all reports in the catalog
    List,
    /// Run a single report
    Run {
        /// Report identifier (e.g., "`top_departure_origins`")
        report: String,
        /// Dataset file (`.csv`, `.csv.gz`, `.json`, `.jsonl`). Defaults to
        /// `CRASH_REPORTS_DATA`
        #[arg(long)]
        data: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// Maximum number of records to load (for testing)
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Run every report in the catalog concurrently
    All {
        /// Dataset file. Defaults to `CRASH_REPORTS_DATA`
        #[arg(long)]
        data: Option<PathBuf>,
        /// Per-report time limit in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Maximum number of records to load (for testing)
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Aligned text columns
    Table,
    /// Pretty-printed JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            for def in registry::catalog() {
                println!("{:<32} {}", def.id, def.title);
            }
        }
        Commands::Run {
            report,
            data,
            format,
            limit,
        } => {
            // Resolve the name before touching the dataset.
            let report: ReportName = report
                .parse()
                .map_err(|_| ReportError::UnknownReport { name: report })?;
            let records = load(data, limit)?;
            let output = crash_reports_report::run(report, &records)?;
            print_output(&output, format)?;
        }
        Commands::All {
            data,
            timeout_secs,
            format,
            limit,
        } => {
            let records: Arc<[AccidentRecord]> = load(data, limit)?.into();
            let timeout = timeout_secs.map(Duration::from_secs);
            let results = runner::run_catalog(records, timeout).await;

            let mut failed = 0_usize;
            let mut json = Vec::with_capacity(results.len());
            for (report, result) in &results {
                match (result, format) {
                    (Ok(output), OutputFormat::Table) => {
                        println!("{}", table::render(output));
                    }
                    (Ok(output), OutputFormat::Json) => json.push(serde_json::to_value(output)?),
                    (Err(e), _) => {
                        failed += 1;
                        log::error!("{report}: {e}");
                        json.push(serde_json::json!({ "report": report, "error": e.to_string() }));
                    }
                }
            }

            if matches!(format, OutputFormat::Json) {
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            if failed > 0 {
                return Err(format!("{failed} reports failed").into());
            }
        }
    }

    Ok(())
}

fn load(
    data: Option<PathBuf>,
    limit: Option<u64>,
) -> Result<Vec<AccidentRecord>, Box<dyn std::error::Error>> {
    let path = data
        .or_else(|| std::env::var(DATA_ENV).ok().map(PathBuf::from))
        .ok_or_else(|| format!("No dataset given: pass --data or set {DATA_ENV}"))?;

    Ok(load_records(&path, LoadOptions { max_records: limit })?)
}

fn print_output(
    output: &ReportOutput,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Table => println!("{}", table::render(output)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(output)?),
    }
    Ok(())
}
