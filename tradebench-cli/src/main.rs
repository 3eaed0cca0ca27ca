//! The tradebench binary

use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tradebench_config::{BenchConfig, Validatable};
use tradebench_core::RunSignal;
use tradebench_engine::{FinalState, Manager, Runner};

mod cli;
use cli::{Cli, Commands, RunArgs, VerifyStateArgs};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::VerifyState(args) => verify_state(args).await,
    }
}

fn build_config(args: &RunArgs) -> Result<BenchConfig> {
    let mut config = BenchConfig::default();
    config.target.app_url = args.app_url.clone();
    config.target.bank_url = args.bank_url.clone();
    config.target.log_url = args.log_url.clone();
    config.target.internal_bank_url = args
        .internal_bank_url
        .clone()
        .unwrap_or_else(|| args.bank_url.clone());
    config.target.internal_log_url = args
        .internal_log_url
        .clone()
        .unwrap_or_else(|| args.log_url.clone());
    if let Some(secs) = args.duration_secs {
        config.benchmark.duration = Duration::from_secs(secs);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    let manager = Arc::new(
        Manager::new(config.clone(), args.state_out.clone()).context("manager setup failed")?,
    );

    let ctx = RunSignal::new();
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; aborting the run");
                ctx.cancel();
            }
        });
    }

    let mut runner = Runner::new(manager);
    let message = match runner.run(&ctx).await {
        Ok(()) => "ok".to_string(),
        Err(err) => {
            warn!(%err, "benchmark run ended early");
            err.to_string()
        }
    };

    let mut result = runner.result();
    result.job_id = args.job_id.unwrap_or_default();
    result.target = config.target.app_url.clone();
    result.message = message;

    match &args.result {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not create {}", path.display()))?;
            serde_json::to_writer_pretty(file, &result)?;
        }
        None => {
            serde_json::to_writer_pretty(std::io::stdout().lock(), &result)?;
            println!();
        }
    }
    Ok(())
}

async fn verify_state(args: VerifyStateArgs) -> Result<()> {
    let state = FinalState::load(&args.state_file)
        .with_context(|| format!("could not load {}", args.state_file.display()))?;
    let config = BenchConfig::default();
    let ctx = RunSignal::new();
    state
        .check(&ctx, &config.client)
        .await
        .context("saved state no longer matches the target")?;
    info!("state verified: {}", args.state_file.display());
    Ok(())
}
