//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;
use crate::utils::LogLevel;

/// Signed webhook conformance runner
#[derive(Parser, Debug)]
#[command(name = "webhook-tester")]
#[command(version)]
#[command(about = "Send signed webhook payloads and verify responses and delivery events")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the test suite
    Run(RunArgs),

    /// Create or update Qase cases from the suite
    Sync(SuiteArgs),

    /// List the suite's test cases
    List(SuiteArgs),
}

/// Suite file selection shared by all commands
#[derive(Parser, Debug, Clone)]
pub struct SuiteArgs {
    /// Suite definition (YAML or JSON); searched in standard locations if omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Directory for the HTML and JUnit reports
    #[arg(short, long, default_value = "results")]
    pub output_dir: PathBuf,

    /// Console output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Run cases in parallel
    #[arg(short, long)]
    pub parallel: bool,

    /// Number of concurrent cases (when parallel)
    #[arg(long, default_value = "4")]
    pub concurrent: usize,

    /// Override the suite's per-request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Do not wait for Pub/Sub delivery events
    #[arg(long)]
    pub skip_delivery: bool,

    /// Accept invalid TLS certificates on the target
    #[arg(long)]
    pub insecure: bool,

    /// Exit with a non-zero status when any case fails
    #[arg(long)]
    pub fail_on_error: bool,

    /// Skip writing HTML and JUnit reports
    #[arg(long)]
    pub no_reports: bool,
}
