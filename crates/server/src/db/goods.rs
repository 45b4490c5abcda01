//! Goods repository: catalog listing, search, statistics and admin edits.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use mall_core::{GoodsId, GoodsStatus};

use super::{Page, PageRequest, RepositoryError, contains_pattern};
use crate::models::Goods;
use crate::models::catalog::PROMOTED_TYPE;

const GOODS_COLUMNS: &str = "id, category_code, img_url, description, tag, des1, des2, type, \
     price, h5url, recommend, status, sales_count, rating, view_count, created_at, \
     store_name, store_rating, store_level, shipping";

/// Ordering for goods listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoodsSort {
    /// Promoted goods first, then newest id.
    PromotedFirst,
    /// Recommended, then sales, rating and recency, all descending.
    Smart,
    #[default]
    SalesDesc,
    RatingDesc,
    NewArrival,
    PriceAsc,
    PriceDesc,
    /// Admin-chosen column from a fixed whitelist.
    Column {
        column: &'static str,
        ascending: bool,
    },
}

impl GoodsSort {
    /// Admin sort fields mapped to their columns.
    const ADMIN_COLUMNS: [(&'static str, &'static str); 7] = [
        ("id", "id"),
        ("price", "CAST(price AS REAL)"),
        ("salesCount", "sales_count"),
        ("rating", "rating"),
        ("viewCount", "view_count"),
        ("createdAt", "created_at"),
        ("description", "description"),
    ];

    /// Resolve an admin `sortField`/`sortDir` pair. Unknown fields sort by id.
    #[must_use]
    pub fn admin(field: &str, direction: &str) -> Self {
        let column = Self::ADMIN_COLUMNS
            .iter()
            .find(|(name, _)| *name == field)
            .map_or("id", |(_, column)| *column);
        Self::Column {
            column,
            ascending: direction.eq_ignore_ascii_case("asc"),
        }
    }

    fn order_by(self) -> String {
        let clause = match self {
            Self::PromotedFirst => {
                return format!(
                    "CASE WHEN type = '{PROMOTED_TYPE}' THEN 0 ELSE 1 END, id DESC"
                );
            }
            Self::Smart => "recommend DESC, sales_count DESC, rating DESC, created_at DESC",
            Self::SalesDesc => "sales_count DESC",
            Self::RatingDesc => "rating DESC",
            Self::NewArrival => "created_at DESC",
            Self::PriceAsc => "CAST(price AS REAL) ASC",
            Self::PriceDesc => "CAST(price AS REAL) DESC",
            Self::Column { column, ascending } => {
                let dir = if ascending { "ASC" } else { "DESC" };
                return format!("{column} {dir}, id DESC");
            }
        };
        format!("{clause}, id DESC")
    }
}

/// Which text fields a keyword is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordScope {
    /// description, tag, des1, des2 and category code.
    #[default]
    Storefront,
    /// description and tag.
    Admin,
}

/// Filter for [`GoodsRepository::list`]. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct GoodsFilter {
    pub category_code: Option<String>,
    pub exclude_promoted: bool,
    pub status: Option<GoodsStatus>,
    pub recommended_only: bool,
    pub keyword: Option<String>,
    pub keyword_scope: KeywordScope,
}

impl GoodsFilter {
    /// Goods visible to app customers.
    #[must_use]
    pub fn storefront() -> Self {
        Self {
            status: Some(GoodsStatus::Active),
            ..Self::default()
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(code) = &self.category_code {
            qb.push(" AND category_code = ").push_bind(code.clone());
        }
        if self.exclude_promoted {
            qb.push(" AND (type IS NULL OR type <> ")
                .push_bind(PROMOTED_TYPE)
                .push(")");
        }
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if self.recommended_only {
            qb.push(" AND recommend = 1");
        }
        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            let pattern = contains_pattern(keyword);
            let fields: &[&str] = match self.keyword_scope {
                KeywordScope::Storefront => {
                    &["description", "tag", "des1", "des2", "category_code"]
                }
                KeywordScope::Admin => &["description", "tag"],
            };
            qb.push(" AND (");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(format!("LOWER(COALESCE({field}, '')) LIKE "))
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            qb.push(")");
        }
    }
}

/// New goods row (admin create or fixture import).
#[derive(Debug, Clone, Default)]
pub struct NewGoods {
    pub category_code: Option<String>,
    pub img_url: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub des1: Option<String>,
    pub des2: Option<String>,
    pub kind: Option<String>,
    pub price: Option<String>,
    pub h5url: Option<String>,
    pub recommend: Option<bool>,
    pub status: GoodsStatus,
    pub store_name: Option<String>,
    pub stats: Option<GoodsStats>,
}

/// Synthetic popularity statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoodsStats {
    pub sales_count: i64,
    pub rating: f64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub recommend: bool,
}

/// Repository for goods database operations.
pub struct GoodsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GoodsRepository<'a> {
    /// Create a new goods repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get goods by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: GoodsId) -> Result<Option<Goods>, RepositoryError> {
        let goods = sqlx::query_as::<_, Goods>(&format!(
            "SELECT {GOODS_COLUMNS} FROM goods WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(goods)
    }

    /// List one page of goods matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &GoodsFilter,
        sort: GoodsSort,
        request: PageRequest,
    ) -> Result<Page<Goods>, RepositoryError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM goods");
        filter.push_where(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {GOODS_COLUMNS} FROM goods"));
        filter.push_where(&mut select);
        select
            .push(" ORDER BY ")
            .push(sort.order_by())
            .push(" LIMIT ")
            .push_bind(request.size)
            .push(" OFFSET ")
            .push_bind(request.offset());
        let items = select.build_query_as::<Goods>().fetch_all(self.pool).await?;

        Ok(Page {
            items,
            total,
            request,
        })
    }

    /// First `limit` goods in a category, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category_code: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Goods>, RepositoryError> {
        let goods = sqlx::query_as::<_, Goods>(&format!(
            "SELECT {GOODS_COLUMNS} FROM goods WHERE category_code IS ? ORDER BY id LIMIT ?"
        ))
        .bind(category_code)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(goods)
    }

    /// Whether any goods exist in a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_in_category(&self, category_code: &str) -> Result<bool, RepositoryError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM goods WHERE category_code = ? LIMIT 1")
                .bind(category_code)
                .fetch_optional(self.pool)
                .await?;

        Ok(found.is_some())
    }

    /// Insert goods, returning the new ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, goods: &NewGoods) -> Result<GoodsId, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        create_in(&mut conn, goods).await
    }

    /// Persist every editable field of `goods`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row no longer exists.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn save(&self, goods: &Goods) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE goods
            SET category_code = ?, img_url = ?, description = ?, tag = ?, des1 = ?, des2 = ?,
                price = ?, recommend = ?, status = ?, store_name = ?
            WHERE id = ?
            ",
        )
        .bind(&goods.category_code)
        .bind(&goods.img_url)
        .bind(&goods.description)
        .bind(&goods.tag)
        .bind(&goods.des1)
        .bind(&goods.des2)
        .bind(&goods.price)
        .bind(goods.recommend)
        .bind(goods.status.as_str())
        .bind(&goods.store_name)
        .bind(goods.id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Add one to `view_count` (null counts as zero). Returns whether the goods exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn increment_views(&self, id: GoodsId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE goods SET view_count = COALESCE(view_count, 0) + 1 WHERE id = ?")
                .bind(id.as_i64())
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add one to `sales_count` (null counts as zero). Returns whether the goods exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn increment_sales(&self, id: GoodsId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE goods SET sales_count = COALESCE(sales_count, 0) + 1 WHERE id = ?")
                .bind(id.as_i64())
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Goods with at least one missing statistic.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_missing_stats(&self) -> Result<Vec<Goods>, RepositoryError> {
        let goods = sqlx::query_as::<_, Goods>(&format!(
            "SELECT {GOODS_COLUMNS} FROM goods \
             WHERE sales_count IS NULL OR rating IS NULL OR view_count IS NULL \
                OR created_at IS NULL OR recommend IS NULL \
             ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(goods)
    }

    /// Write back backfilled statistics.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_stats(&self, goods: &Goods) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE goods
            SET sales_count = ?, rating = ?, view_count = ?, created_at = ?, recommend = ?
            WHERE id = ?
            ",
        )
        .bind(goods.sales_count)
        .bind(goods.rating)
        .bind(goods.view_count)
        .bind(goods.created_at)
        .bind(goods.recommend)
        .bind(goods.id.as_i64())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Count all goods, or those with `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, status: Option<GoodsStatus>) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goods WHERE ?1 IS NULL OR status = ?1")
            .bind(status.map(|s| s.as_str()))
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Total sales per category over active goods.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_by_category(&self) -> Result<Vec<(Option<String>, i64)>, RepositoryError> {
        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
            r"
            SELECT category_code, COALESCE(SUM(sales_count), 0)
            FROM goods
            WHERE status = 'ACTIVE'
            GROUP BY category_code
            ORDER BY category_code
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// [`GoodsRepository::create`] on a caller-held connection or transaction.
pub(crate) async fn create_in(
    conn: &mut SqliteConnection,
    goods: &NewGoods,
) -> Result<GoodsId, RepositoryError> {
    let stats = goods.stats;
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO goods (
            category_code, img_url, description, tag, des1, des2, type, price, h5url,
            recommend, status, store_name, sales_count, rating, view_count, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(&goods.category_code)
    .bind(&goods.img_url)
    .bind(&goods.description)
    .bind(&goods.tag)
    .bind(&goods.des1)
    .bind(&goods.des2)
    .bind(&goods.kind)
    .bind(&goods.price)
    .bind(&goods.h5url)
    .bind(stats.map(|s| s.recommend).or(goods.recommend))
    .bind(goods.status.as_str())
    .bind(&goods.store_name)
    .bind(stats.map(|s| s.sales_count))
    .bind(stats.map(|s| s.rating))
    .bind(stats.map(|s| s.view_count))
    .bind(stats.map(|s| s.created_at))
    .fetch_one(&mut *conn)
    .await?;

    Ok(GoodsId::new(id))
}
