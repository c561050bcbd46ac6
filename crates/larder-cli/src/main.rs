//! Command-line tooling for Larder
//!
//! Inspects the access rule table and drives a filesystem-backed claim
//! cache for smoke tests and support work.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{
    claims::{handle_claims_command, ClaimsArgs},
    policy::{handle_policy_command, PolicyCommand},
};
use config::LarderConfig;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Larder - donation access rules and offline claim cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".larder/config.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and evaluate access rules
    #[command(subcommand)]
    Policy(PolicyCommand),

    /// Operate on the local claim cache
    Claims(ClaimsArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = LarderConfig::load(&cli.config)?;

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.filter.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Policy(cmd) => handle_policy_command(cmd)?,
        Commands::Claims(args) => handle_claims_command(args, &config).await?,
    }

    Ok(())
}
