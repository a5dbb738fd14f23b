//! # Job Desk Main Entry Point
//!
//! `jobdesk serve` (the default) migrates, seeds and serves the API.
//! `jobdesk migrate` only applies migrations.

use clap::{Parser, Subcommand};
use jobdesk::{
    config::ConfigLoader,
    db::{init_pool, run_migrations},
    seeds::seed_bootstrap_admin,
    server::run_server,
    telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(name = "jobdesk", version, about = "Shipment job desk API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations, seed the bootstrap admin and serve the API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;
    run_migrations(&db).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => Ok(()),
        Command::Serve => {
            seed_bootstrap_admin(&db, &config).await?;
            run_server(config, db).await
        }
    }
}
