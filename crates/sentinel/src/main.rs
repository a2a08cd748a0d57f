//! sentinel - DevSentinel CLI
//!
//! Reports incidents to sentinel-server and inspects their triage and repair.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod cli;
mod commands;
mod config;
mod error;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("sentinel=warn".parse()?))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load()?;
    tracing::debug!(api = %config.api.url, "Config loaded");

    // Execute command
    match cli.command {
        Commands::Report(args) => commands::incident::report(args, &config).await,
        Commands::Show { id, json } => commands::incident::show(&id, json, &config).await,
        Commands::List { skip, limit, json } => {
            commands::incident::list(skip, limit, json, &config).await
        }
        Commands::Repair { id, json } => commands::repair::execute(&id, json, &config).await,
        Commands::Delete { id } => commands::incident::delete(&id, &config).await,
        Commands::Stats { json } => commands::status::stats(json, &config).await,
        Commands::Activity { limit, json } => {
            commands::status::activity(limit, json, &config).await
        }
        Commands::Health { json } => commands::status::health(json, &config).await,
        Commands::Version => {
            println!("sentinel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
