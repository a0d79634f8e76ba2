mod cds;
mod cli;
mod error;
mod fetch;
mod inventory;
mod merge;
mod plan;
mod request;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match &cli.command {
        Commands::Fetch(args) => command::fetch(args).await,
        Commands::Means(args) => command::means(args).await,
        Commands::Merge(args) => command::merge(args),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
