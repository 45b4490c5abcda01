//! Mall CLI - Database migrations and fixture management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! mall-cli migrate
//!
//! # Import the fixture tree (defaults to MALL_FIXTURES_DIR)
//! mall-cli seed --fixtures mock_server/api
//!
//! # Fill in missing goods statistics
//! mall-cli backfill
//! ```
//!
//! The database is read from `MALL_DATABASE_URL`, as for the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mall-cli")]
#[command(author, version, about = "Mall backend CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import recorded fixtures into the database
    Seed {
        /// Fixture root directory (overrides `MALL_FIXTURES_DIR`)
        #[arg(short, long)]
        fixtures: Option<PathBuf>,
    },
    /// Give goods with missing statistics synthetic values
    Backfill,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { fixtures } => commands::seed::fixtures(fixtures).await?,
        Commands::Backfill => commands::seed::backfill().await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_accepts_fixture_override() {
        let cli = Cli::try_parse_from(["mall-cli", "seed", "--fixtures", "/tmp/api"]).unwrap();
        match cli.command {
            Commands::Seed { fixtures } => assert_eq!(fixtures, Some(PathBuf::from("/tmp/api"))),
            _ => panic!("expected seed"),
        }
    }
}
