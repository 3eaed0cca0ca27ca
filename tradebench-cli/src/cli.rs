//! Command-line interface definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tradebench", version, about = "Load benchmarker for the exchange web service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full benchmark against a target
    Run(RunArgs),
    /// Re-verify a saved final-state snapshot, e.g. after a target reboot
    VerifyState(VerifyStateArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Base URL of the exchange application under test
    #[arg(long, default_value = "http://localhost:5000")]
    pub app_url: String,

    /// Bank endpoint handed to the target on /initialize
    #[arg(long, default_value = "http://localhost:5515")]
    pub bank_url: String,

    /// Log endpoint handed to the target on /initialize
    #[arg(long, default_value = "http://localhost:5516")]
    pub log_url: String,

    /// Bank endpoint the benchmarker itself uses
    #[arg(long)]
    pub internal_bank_url: Option<String>,

    /// Log endpoint the benchmarker itself uses
    #[arg(long)]
    pub internal_log_url: Option<String>,

    /// Benchmark duration in seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Job id echoed into the result document
    #[arg(long)]
    pub job_id: Option<String>,

    /// Write the result JSON here instead of stdout
    #[arg(long)]
    pub result: Option<PathBuf>,

    /// Save a final-state snapshot for later re-verification
    #[arg(long)]
    pub state_out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct VerifyStateArgs {
    /// Snapshot file written by a previous `run --state-out`
    pub state_file: PathBuf,
}
