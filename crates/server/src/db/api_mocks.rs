//! Recorded mock responses.

use sqlx::{SqliteConnection, SqlitePool};

use super::RepositoryError;
use crate::models::ApiMock;

/// Repository for the `api_mock` table.
pub struct ApiMockRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ApiMockRepository<'a> {
    /// Create a new mock repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the recorded response for a path and method.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, path: &str, method: &str) -> Result<Option<ApiMock>, RepositoryError> {
        let mock = sqlx::query_as::<_, ApiMock>(
            "SELECT id, path, method, response_body FROM api_mock WHERE path = ? AND method = ?",
        )
        .bind(path)
        .bind(method)
        .fetch_optional(self.pool)
        .await?;

        Ok(mock)
    }

    /// Count recorded responses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_mock")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Record a response unless one already exists for the path and method.
    /// Returns whether a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, path: &str, method: &str, body: &str) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        insert_in(&mut conn, path, method, body).await
    }
}

/// [`ApiMockRepository::insert`] on a caller-held connection or transaction.
pub(crate) async fn insert_in(
    conn: &mut SqliteConnection,
    path: &str,
    method: &str,
    body: &str,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "INSERT INTO api_mock (path, method, response_body) VALUES (?, ?, ?) \
         ON CONFLICT (path, method) DO NOTHING",
    )
    .bind(path)
    .bind(method)
    .bind(body)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
