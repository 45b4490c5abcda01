//! News articles.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mall_core::ArticleId;

use super::date_only;

/// A news article.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Article {
    #[sqlx(try_from = "i64")]
    pub id: ArticleId,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub view_count: i64,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Article as rendered in lists (`content` omitted) and detail views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub id: ArticleId,
    pub title: String,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub view_count: i64,
    pub published_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ArticleView {
    /// List view without the body.
    #[must_use]
    pub fn summary(article: Article) -> Self {
        Self::build(article, false)
    }

    /// Detail view including the body.
    #[must_use]
    pub fn detail(article: Article) -> Self {
        Self::build(article, true)
    }

    fn build(article: Article, with_content: bool) -> Self {
        Self {
            id: article.id,
            published_at: date_only(&article.published_at),
            title: article.title,
            summary: article.summary,
            image_url: article.image_url,
            category: article.category,
            source: article.source,
            view_count: article.view_count,
            content: if with_content {
                Some(article.content.unwrap_or_default())
            } else {
                None
            },
        }
    }
}
