//! Glucose Control - CLI for the glucose voice skill
//!
//! Checks Nightscout from the terminal and pokes a running glucosed.

use anyhow::Result;
use clap::Parser;
use glucosectl::cli::{Cli, Commands};
use glucosectl::commands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Reading { json } => commands::handle_reading(json).await,
        Commands::Ask { intent, url } => commands::handle_ask(intent, url).await,
        Commands::Config => commands::handle_config(),
    }
}
