//! Fixture import commands.
//!
//! Seeding is idempotent: each table is only imported while it is empty, so
//! re-running after a partial import fills in what is missing.

use std::path::PathBuf;

use tracing::info;

use mall_server::db;
use mall_server::services::seeder::{self, Seeder};

/// Import the fixture tree, then backfill statistics.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a fixture is invalid.
pub async fn fixtures(root: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = super::connect().await?;
    db::run_migrations(&pool).await?;

    let root = root.unwrap_or(config.fixtures_dir);
    info!(root = %root.display(), "Seeding fixtures");

    let report = Seeder::new(&pool, root).run().await?;

    info!("Seeding complete!");
    info!("  Mock responses recorded: {}", report.mocks_recorded);
    info!("  Mock files skipped: {}", report.mocks_skipped);
    info!("  Typed imports: {}", report.imported.join(", "));
    info!("  Goods backfilled: {}", report.backfilled);

    Ok(())
}

/// Fill in missing goods statistics without importing anything.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a write fails.
pub async fn backfill() -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = super::connect().await?;
    db::run_migrations(&pool).await?;

    let updated = seeder::backfill(&pool).await?;
    info!(updated, "Backfill complete!");

    Ok(())
}
