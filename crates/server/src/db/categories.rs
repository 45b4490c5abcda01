//! Category tree persistence.

use sqlx::{SqliteConnection, SqlitePool};

use super::RepositoryError;
use crate::models::Category;

const CATEGORY_COLUMNS: &str = "id, code, name, parent_code, level, icon_url, banner_url";

/// A category row to insert.
#[derive(Debug, Clone, Default)]
pub struct NewCategory<'c> {
    pub code: &'c str,
    pub name: &'c str,
    pub parent_code: Option<&'c str>,
    pub level: i64,
    pub icon_url: Option<&'c str>,
    pub banner_url: Option<&'c str>,
}

/// Repository for the category tree.
pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Categories at `level` in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_level(&self, level: i64) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE level = ? ORDER BY id"
        ))
        .bind(level)
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Direct children of `parent_code` in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn children(&self, parent_code: &str) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE parent_code = ? ORDER BY id"
        ))
        .bind(parent_code)
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Get a category by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE code = ?"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;
        Ok(category)
    }

    /// Count categories, optionally only those at `level`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, level: Option<i64>) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM category WHERE ?1 IS NULL OR level = ?1")
                .bind(level)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}

/// Insert a category. An existing code is left untouched; returns whether a
/// row was inserted.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub(crate) async fn insert_in(
    conn: &mut SqliteConnection,
    category: &NewCategory<'_>,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        INSERT INTO category (code, name, parent_code, level, icon_url, banner_url)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (code) DO NOTHING
        ",
    )
    .bind(category.code)
    .bind(category.name)
    .bind(category.parent_code)
    .bind(category.level)
    .bind(category.icon_url)
    .bind(category.banner_url)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Set the banner shown above a category's children.
pub(crate) async fn set_banner_in(
    conn: &mut SqliteConnection,
    code: &str,
    banner_url: &str,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("UPDATE category SET banner_url = ? WHERE code = ?")
        .bind(banner_url)
        .bind(code)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;

    #[tokio::test]
    async fn test_tree_queries() {
        let pool = test_pool().await;
        let repo = CategoryRepository::new(&pool);
        let mut conn = pool.acquire().await.unwrap();
        for (code, parent, level) in [
            ("000", None, 1),
            ("001", None, 1),
            ("A", Some("000"), 2),
            ("A1", Some("A"), 3),
            ("A2", Some("A"), 3),
        ] {
            insert_in(
                &mut conn,
                &NewCategory {
                    code,
                    name: code,
                    parent_code: parent,
                    level,
                    ..NewCategory::default()
                },
            )
            .await
            .unwrap();
        }

        let duplicate = NewCategory {
            code: "A",
            name: "dup",
            level: 2,
            ..NewCategory::default()
        };
        assert!(!insert_in(&mut conn, &duplicate).await.unwrap());
        assert!(set_banner_in(&mut conn, "000", "banner.png").await.unwrap());
        drop(conn);

        assert_eq!(repo.list_level(1).await.unwrap().len(), 2);
        assert_eq!(repo.count(Some(3)).await.unwrap(), 2);
        assert_eq!(repo.count(None).await.unwrap(), 5);

        let children: Vec<_> = repo
            .children("A")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(children, vec!["A1", "A2"]);
        assert_eq!(repo.get_by_code("A").await.unwrap().unwrap().name, "A");
        let root = repo.get_by_code("000").await.unwrap().unwrap();
        assert_eq!(root.banner_url.as_deref(), Some("banner.png"));
    }
}
