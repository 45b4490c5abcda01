//! Subcommand implementations.

pub mod migrate;
pub mod seed;

use mall_server::config::ServerConfig;
use mall_server::db;
use sqlx::SqlitePool;

/// Load the server configuration and open its database.
async fn connect() -> Result<(ServerConfig, SqlitePool), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    Ok((config, pool))
}
