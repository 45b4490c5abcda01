//! News article persistence.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use mall_core::ArticleId;

use super::{Page, PageRequest, RepositoryError};
use crate::models::Article;

const ARTICLE_COLUMNS: &str = "id, title, summary, content, image_url, category, source, \
     view_count, published_at, created_at";

/// Fields for a new article.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
}

/// Repository for news articles.
pub struct ArticleRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new article repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Count all articles.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM article")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// One page of articles, most recently published first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<&str>,
        request: PageRequest,
    ) -> Result<Page<Article>, RepositoryError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM article WHERE ?1 IS NULL OR category = ?1")
                .bind(category)
                .fetch_one(self.pool)
                .await?;

        let items = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM article WHERE ?1 IS NULL OR category = ?1 \
             ORDER BY published_at DESC, id DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(category)
        .bind(request.size)
        .bind(request.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page {
            items,
            total,
            request,
        })
    }

    /// Get an article by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ArticleId) -> Result<Option<Article>, RepositoryError> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM article WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(article)
    }

    /// Insert an article. `published_at` defaults to now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, article: &NewArticle) -> Result<Article, RepositoryError> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Article>(&format!(
            "INSERT INTO article (title, summary, content, image_url, category, source, view_count, published_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(&article.title)
        .bind(&article.summary)
        .bind(&article.content)
        .bind(&article.image_url)
        .bind(&article.category)
        .bind(&article.source)
        .bind(article.view_count)
        .bind(article.published_at.unwrap_or(now))
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Persist the editable fields of an article.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, article: &Article) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE article
            SET title = ?, summary = ?, content = ?, image_url = ?, category = ?, source = ?
            WHERE id = ?
            ",
        )
        .bind(&article.title)
        .bind(&article.summary)
        .bind(&article.content)
        .bind(&article.image_url)
        .bind(&article.category)
        .bind(&article.source)
        .bind(article.id.as_i64())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete an article. Deleting a missing ID is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ArticleId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM article WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Bump the view counter and return the updated article.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_view(&self, id: ArticleId) -> Result<Option<Article>, RepositoryError> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "UPDATE article SET view_count = view_count + 1 WHERE id = ? RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(article)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::tests::test_pool;

    fn article(title: &str, category: &str, age_hours: i64) -> NewArticle {
        NewArticle {
            title: title.to_owned(),
            category: Some(category.to_owned()),
            published_at: Some(Utc::now() - Duration::hours(age_hours)),
            ..NewArticle::default()
        }
    }

    #[tokio::test]
    async fn test_list_newest_first_with_category() {
        let pool = test_pool().await;
        let repo = ArticleRepository::new(&pool);
        repo.create(&article("old", "TECH", 48)).await.unwrap();
        repo.create(&article("new", "INDUSTRY", 1)).await.unwrap();
        repo.create(&article("mid", "TECH", 24)).await.unwrap();

        let all = repo.list(None, PageRequest::new(0, 10)).await.unwrap();
        let titles: Vec<_> = all.items.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);

        let tech = repo
            .list(Some("TECH"), PageRequest::new(0, 1))
            .await
            .unwrap();
        assert_eq!(tech.total, 2);
        assert_eq!(tech.items[0].title, "mid");
        assert!(tech.has_more());
    }

    #[tokio::test]
    async fn test_record_view() {
        let pool = test_pool().await;
        let repo = ArticleRepository::new(&pool);
        let created = repo.create(&article("a", "TECH", 0)).await.unwrap();

        let viewed = repo.record_view(created.id).await.unwrap().unwrap();
        assert_eq!(viewed.view_count, created.view_count + 1);
        assert!(repo.record_view(ArticleId::new(999)).await.unwrap().is_none());

        repo.delete(created.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
