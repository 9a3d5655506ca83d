//! CLI entry point for the QoS Rater tool.
//!
//! Provides subcommands for merging raw network measurement exports into one
//! combined CSV, analyzing a combined CSV, and running both in sequence.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use qos_rater::analyzers::analyzer::{Analyzer, ReadingFilter};
use qos_rater::analyzers::views::{DEFAULT_HISTOGRAM_BINS, MAX_HISTOGRAM_BINS};
use qos_rater::{
    config::PipelineConfig,
    output::{WriteOptions, render_summary, to_json, write_dataset},
    pipeline::{collect, is_no_input, load_for_analysis},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "qos_rater")]
#[command(about = "A tool to normalize and rate network QoS measurement logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Rounded, labelled summary lines
    Text,
    /// Full dashboard report as JSON
    Json,
}

#[derive(clap::Args)]
struct CollectArgs {
    /// Directory containing raw CSV exports
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// Combined CSV file to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only use the most recently modified input file
    #[arg(long, default_value_t = false)]
    latest: bool,

    /// Include the derived Signal_Quality column
    #[arg(long, default_value_t = false)]
    with_quality: bool,
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    /// Only include readings of these network types (repeatable)
    #[arg(short = 't', long = "network-type", value_name = "TYPE")]
    network_types: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Number of signal histogram bins in the JSON report
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS, value_parser = parse_bins)]
    bins: usize,

    /// Also write the dataset with Signal_Quality to this path
    #[arg(long, value_name = "PATH")]
    annotated: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge all raw CSVs into one normalized CSV
    Collect(CollectArgs),
    /// Summarize a combined CSV
    Analyze {
        /// Combined CSV to analyze
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        args: AnalyzeArgs,
    },
    /// Collect, then analyze the combined CSV
    Run {
        #[command(flatten)]
        collect: CollectArgs,

        #[command(flatten)]
        analyze: AnalyzeArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/qos_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("qos_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::load_from_env()?;

    let result = match cli.command {
        Commands::Collect(args) => {
            let config = apply_overrides(config, &args);
            config.log_config();
            run_collect(&config, &args).map(|_| ())
        }
        Commands::Analyze { input, args } => {
            config.log_config();
            run_analyze(&config, &input, &args)
        }
        Commands::Run {
            collect: collect_args,
            analyze: analyze_args,
        } => {
            let config = apply_overrides(config, &collect_args);
            config.log_config();
            run_collect(&config, &collect_args)
                .and_then(|output| run_analyze(&config, &output, &analyze_args))
        }
    };

    match result {
        Err(e) if is_no_input(&e) => {
            warn!(error = %e, "Nothing to process, no output written");
            Ok(())
        }
        other => other,
    }
}

fn parse_bins(value: &str) -> Result<usize, String> {
    let bins: usize = value
        .parse()
        .map_err(|e| format!("`{value}` is not a bin count: {e}"))?;
    if (1..=MAX_HISTOGRAM_BINS).contains(&bins) {
        Ok(bins)
    } else {
        Err(format!("bin count must be between 1 and {MAX_HISTOGRAM_BINS}"))
    }
}

fn apply_overrides(mut config: PipelineConfig, args: &CollectArgs) -> PipelineConfig {
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(output) = &args.output {
        config.output_file = output.clone();
    }
    config
}

/// Builds the combined CSV and returns its path.
fn run_collect(config: &PipelineConfig, args: &CollectArgs) -> Result<PathBuf> {
    let outcome = collect(
        config,
        args.latest,
        WriteOptions {
            with_quality: args.with_quality,
        },
    )?;

    for skipped in &outcome.skipped {
        warn!(error = %skipped, "Input skipped");
    }
    info!(
        sources = outcome.sources.len(),
        skipped = outcome.skipped.len(),
        rows = outcome.dataset.len(),
        output = %outcome.output.display(),
        "Data collected"
    );
    Ok(outcome.output)
}

/// Prints the summary (or dashboard report) for a combined CSV.
#[tracing::instrument(skip(config, input, args), fields(input = %input.display()))]
fn run_analyze(config: &PipelineConfig, input: &Path, args: &AnalyzeArgs) -> Result<()> {
    let dataset = load_for_analysis(input, &config.limits())?;
    let analyzer = Analyzer::new().with_histogram_bins(args.bins);
    let filter = ReadingFilter::network_types(args.network_types.iter().cloned());

    if let Some(path) = &args.annotated {
        write_dataset(path, &dataset, WriteOptions { with_quality: true })?;
    }

    match args.format {
        Format::Text => {
            let summary = analyzer.summarize_where(&dataset, |r| filter.matches(r));
            println!("Analysis Summary:");
            print!("{}", render_summary(&summary.report()));
        }
        Format::Json => {
            let report = analyzer.report(&dataset, &filter);
            println!("{}", to_json(&report)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bins_of(cli: Cli) -> usize {
        match cli.command {
            Commands::Analyze { args, .. } => args.bins,
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_bins_default() {
        let cli = Cli::try_parse_from(["qos_rater", "analyze", "out.csv"]).unwrap();
        assert_eq!(bins_of(cli), DEFAULT_HISTOGRAM_BINS);
    }

    #[test]
    fn test_bins_within_range() {
        let cli = Cli::try_parse_from(["qos_rater", "analyze", "out.csv", "--bins", "1000"]).unwrap();
        assert_eq!(bins_of(cli), 1000);
    }

    #[test]
    fn test_bins_out_of_range_rejected() {
        for bad in ["0", "1001", "18446744073709551615", "many"] {
            let parsed = Cli::try_parse_from(["qos_rater", "analyze", "out.csv", "--bins", bad]);
            assert!(parsed.is_err(), "accepted --bins {bad}");
        }
    }
}
