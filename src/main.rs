//! tbm-report - shift report for tunnel boring machine logs
//!
//! # Usage
//!
//! ```bash
//! # Text report with default config search
//! tbm-report --csv shift_2024-03-01.csv
//!
//! # JSON for downstream tooling, site config
//! tbm-report --csv shift.csv --config site.toml --json
//! ```
//!
//! # Environment Variables
//!
//! - `TBM_REPORT_CONFIG`: Path to the TOML config (when `--config` is not given)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use tbm_report::config::ReportConfig;
use tbm_report::narrative::render_report;
use tbm_report::{replay, ShiftReport};

#[derive(Parser, Debug)]
#[command(name = "tbm-report")]
#[command(about = "Work/stop, lithology and gas segmentation report for a TBM shift")]
#[command(version)]
struct CliArgs {
    /// Path to the shift CSV (header row, one timestamp column)
    #[arg(long)]
    csv: PathBuf,

    /// Config file; bypasses the TBM_REPORT_CONFIG / ./tbm_report.toml search
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Leave out per-segment lines, print statistics only
    #[arg(long)]
    no_segments: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "TBM_REPORT_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so stdout stays clean for the report
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let config = match &args.config {
        Some(path) => ReportConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ReportConfig::load(),
    };

    let (log, replay_info) = replay::load(&args.csv, &config.input)
        .with_context(|| format!("Failed to load CSV {}", args.csv.display()))?;
    info!(
        rows = replay_info.rows_loaded,
        skipped = replay_info.skipped_rows,
        channels = %replay_info.channels.join(","),
        "Input ready"
    );

    let report = ShiftReport::build(&log, &config).context("Failed to build shift report")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        println!("{}", render_report(&report, !args.no_segments));
    }

    Ok(())
}
