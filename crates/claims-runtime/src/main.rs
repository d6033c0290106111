//! # Claims Runtime
//!
//! Entry point of the claim verification service.
//!
//! ```text
//! claims-runtime [--config claims.toml] serve
//! claims-runtime [--config claims.toml] sweep
//! claims-runtime [--config claims.toml] reconcile
//! claims-runtime [--config claims.toml] seed --file directory.json
//! claims-runtime [--config claims.toml] state <LISTING_ID>
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared_types::ListingId;
use tracing::{error, info};

use claims_runtime::{init_tracing, ClaimsRuntime, RuntimeConfig, SeedData};

#[derive(Parser)]
#[command(name = "claims-runtime")]
#[command(about = "Listing ownership claim & verification service", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve HTTP and sweep expired claims periodically
    Serve,
    /// Delete expired claims once
    Sweep,
    /// Re-apply commits left behind by failed redemptions
    Reconcile,
    /// Import listings and accounts from a JSON file
    Seed {
        /// File with `{"listings": [...], "accounts": [...]}`
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Print the claim state of a listing
    State {
        /// Listing identifier
        listing_id: ListingId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = RuntimeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.log).context("Failed to initialize logging")?;

    let runtime = ClaimsRuntime::build(config)?;
    let code = match cli.command {
        Command::Serve => {
            info!("Claims service is running. Press Ctrl+C to stop.");
            runtime
                .serve(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl+C: {}", e);
                    }
                })
                .await?;
            ExitCode::SUCCESS
        }
        Command::Sweep => {
            let removed = runtime.sweep_once().await?;
            println!("removed {removed} expired claim(s)");
            ExitCode::SUCCESS
        }
        Command::Reconcile => {
            let report = runtime.reconcile_once().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Seed { file } => {
            let (listings, accounts) = runtime.seed(SeedData::from_json_file(&file)?)?;
            println!("imported {listings} listing(s), {accounts} account(s)");
            ExitCode::SUCCESS
        }
        Command::State { listing_id } => {
            let state = runtime.claim_state(listing_id).await?;
            println!("{}", serde_json::to_string(&state)?);
            ExitCode::SUCCESS
        }
    };

    runtime.shutdown()?;
    Ok(code)
}
