//! CLI entry point for the review ETL pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use review_etl::config::DEFAULT_CONFIG_PATH;
use review_etl::{EtlError, LocalDatasetStore, Pipeline, PipelineConfig, RunSummary};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clean, merge and memory-optimize product item and review datasets",
    long_about = "Loads the items and reviews tables named in the config file, imputes \
                  missing values, normalizes free-text columns, joins both tables on the \
                  product key and writes the memory-optimized result as CSV.\n\n\
                  DATASET LAYOUT:\n  \
                  <datasets-root>/<dataset_id>/[latest/]<file>\n\n\
                  EXAMPLES:\n  \
                  # Run with ./config.yml and ./datasets\n  \
                  review-etl\n\n  \
                  # Custom locations\n  \
                  review-etl --config conf/etl.yml --datasets-root /data --output out/merged.csv\n\n  \
                  # Machine-readable summary\n  \
                  review-etl --json | jq .narrowings"
)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory holding one subdirectory per dataset id
    #[arg(short, long, default_value = "datasets")]
    datasets_root: PathBuf,

    /// Output CSV path (overrides `output_path` from the config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the run summary as JSON on stdout instead of human-readable text
    ///
    /// Disables all logs. On failure the error is printed as
    /// `{"code": ..., "message": ...}` and the process exits non-zero.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    match run(&args) {
        Ok(summary) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_human_readable_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
                std::process::exit(1);
            }
            error!("Pipeline failed: {}", e);
            Err(e).context("review pipeline failed")
        }
    }
}

fn run(args: &Args) -> std::result::Result<RunSummary, EtlError> {
    info!("Loading config...");
    let mut config = PipelineConfig::from_yaml_file(&args.config)?;
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }

    Pipeline::builder()
        .config(config)
        .dataset_store(Arc::new(LocalDatasetStore::new(&args.datasets_root)))
        .build()?
        .run()
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` so the result is visible regardless of log level.
fn print_human_readable_summary(summary: &RunSummary) {
    println!();
    println!("{}", "=".repeat(80));
    println!("PIPELINE COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!(
        "Input rows:      items {}, reviews {}",
        summary.items_rows, summary.reviews_rows
    );
    println!(
        "Output shape:    {} rows x {} columns",
        summary.rows_after, summary.columns_after
    );
    println!("Duration:        {}ms", summary.duration_ms);
    println!();

    println!("STAGES");
    println!("{}", "-".repeat(80));
    for stage in &summary.stages {
        println!("  {:<28} {:>10} rows {:>6} cols", stage.stage, stage.rows, stage.columns);
    }
    println!();

    println!("MEMORY");
    println!("{}", "-".repeat(80));
    println!(
        "  {} -> {} bytes ({:.1}% saved)",
        summary.memory_before_bytes,
        summary.memory_after_bytes,
        summary.memory_saved_percentage()
    );
    for narrowing in &summary.narrowings {
        println!("  {:<28} {} -> {}", narrowing.column, narrowing.from, narrowing.to);
    }
    println!();

    if let Some(path) = &summary.output_path {
        println!("Output written to: {}", path.display());
    }
    println!("{}", "=".repeat(80));
}
