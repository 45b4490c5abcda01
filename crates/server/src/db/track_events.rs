//! Analytics event log.

use chrono::Utc;
use sqlx::SqlitePool;

use mall_core::GoodsId;

use super::RepositoryError;

/// Repository for the `track_event` table.
pub struct TrackEventRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TrackEventRepository<'a> {
    /// Create a new track event repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an event against a goods id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(&self, goods_id: GoodsId, event: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO track_event (goods_id, event, created_at) VALUES (?, ?, ?)")
            .bind(goods_id.as_i64())
            .bind(event)
            .bind(Utc::now())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Count events recorded for a goods id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for(&self, goods_id: GoodsId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM track_event WHERE goods_id = ?")
            .bind(goods_id.as_i64())
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
