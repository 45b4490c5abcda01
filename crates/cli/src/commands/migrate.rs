//! Database migration commands.
//!
//! Migrations live in `crates/server/migrations/` and are embedded into the
//! server crate; the server also applies them at startup.

use mall_server::db;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the database cannot be
/// opened, or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = super::connect().await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
