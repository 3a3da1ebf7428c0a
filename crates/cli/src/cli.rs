//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Metric Tagger - Telemetry record enrichment pipeline
#[derive(Parser, Debug)]
#[command(
    name = "metric-tagger",
    author,
    version,
    about = "Telemetry record enrichment pipeline",
    long_about = "A concurrent enrichment pipeline for telemetry records.\n\n\
                  Reads records from a source, attaches instance metadata tags \n\
                  via bounded parallel lookups, and routes the enriched records \n\
                  to configured sinks, optionally preserving arrival order."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "METRIC_TAGGER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "METRIC_TAGGER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the enrichment pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "METRIC_TAGGER_CONFIG"
    )]
    pub config: PathBuf,

    /// Read records from this NDJSON file, overriding the configured source
    #[arg(long, env = "METRIC_TAGGER_INPUT")]
    pub input: Option<PathBuf>,

    /// Maximum number of records to ingest (0 = unlimited)
    #[arg(long, default_value = "0", env = "METRIC_TAGGER_MAX_RECORDS")]
    pub max_records: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "METRIC_TAGGER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Use the built-in mock metadata client instead of the GCE server
    #[arg(long, env = "METRIC_TAGGER_MOCK_METADATA")]
    pub mock_metadata: bool,

    /// Channel buffer size between the record source and the enricher
    #[arg(long, default_value = "100", env = "METRIC_TAGGER_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "METRIC_TAGGER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show which permitted metadata tags are enabled
    #[arg(long)]
    pub tags: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
