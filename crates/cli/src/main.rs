//! Cylinder Cost Estimator CLI
//!
//! A command-line tool for listing model types and requesting base-cost
//! estimates, either from the estimator service or from local artifacts.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{estimate, models};
use tracing_subscriber::EnvFilter;

/// Cylinder Cost Estimator CLI
#[derive(Parser)]
#[command(name = "ce")]
#[command(author, version, about = "CLI for the Cylinder Cost Estimator", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via CE_API_URL env var)
    #[arg(long, env = "CE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List model types with their required, optional and derived features
    Models {
        /// Query the service, including estimator availability
        #[arg(long)]
        remote: bool,
    },

    /// Estimate the cost of one cylinder configuration
    Estimate(estimate::EstimateArgs),
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::Config::load()?;
    let format = cli.format.or(config.default_format).unwrap_or_default();
    let api_url = config.api_url(cli.api_url.as_deref());

    match cli.command {
        Commands::Models { remote: false } => models::list_local(format),
        Commands::Models { remote: true } => {
            let client = client::ApiClient::new(&api_url)?;
            models::list_remote(&client, format).await?;
        }
        Commands::Estimate(args) => {
            estimate::run(args, &api_url, config.artifact_dir, format).await?;
        }
    }

    Ok(())
}
