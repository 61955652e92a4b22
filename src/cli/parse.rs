//! CLI parse: clap types for the relay host. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Insights relay - availability probing and request telemetry forwarding
#[derive(Parser)]
#[command(name = "insights-relay")]
#[command(about = "Availability probing and request telemetry forwarding")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (config/insights.toml is read from here)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log telemetry envelopes instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Telemetry ingestion endpoint
    #[arg(long, default_value = crate::telemetry::DEFAULT_INGESTION_ENDPOINT)]
    pub endpoint: String,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enable request monitoring and availability probing until interrupted
    Run,
    /// Run one availability cycle now and print the results
    Probe,
    /// Print the resolved settings (key redacted)
    Settings,
}
