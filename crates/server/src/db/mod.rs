//! Database operations for the mall `SQLite` store.
//!
//! ## Tables
//!
//! - `api_mock` - Recorded fixture responses replayed by the mock fallback
//! - `home_banner`, `home_nine_menu`, `home_tab` - Home page content
//! - `mine_function`, `mine_tab` - "Mine" page content
//! - `category` - Three-level category tree
//! - `goods` - Catalog with sales/rating/view statistics
//! - `store`, `cart`, `cart_item` - Per-user carts grouped by store
//! - `orders`, `order_item` - Placed orders
//! - `coupon` - Per-user coupons
//! - `users`, `user_address` - App accounts and shipping addresses
//! - `article` - News articles
//! - `track_event` - Analytics events
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/`, embedded at compile
//! time and applied by the server at boot or explicitly via:
//! ```bash
//! cargo run -p mall-cli -- migrate
//! ```

pub mod addresses;
pub mod api_mocks;
pub mod articles;
pub mod carts;
pub mod categories;
pub mod content;
pub mod coupons;
pub mod goods;
pub mod orders;
pub mod track_events;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use addresses::AddressRepository;
pub use api_mocks::ApiMockRepository;
pub use articles::ArticleRepository;
pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use content::ContentRepository;
pub use coupons::CouponRepository;
pub use goods::GoodsRepository;
pub use orders::OrderRepository;
pub use track_events::TrackEventRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// In-memory URLs (`sqlite::memory:`) get a single long-lived connection so
/// every query sees the same database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the database cannot be opened.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let in_memory = url.contains(":memory:") || url.contains("mode=memory");

    let mut options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
    let pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(10)
    };

    pool_options.connect_with(options).await
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// `LIKE` pattern matching `keyword` anywhere, for use with `ESCAPE '\'`.
///
/// The keyword is ASCII-lowercased to match SQLite's `LOWER()`; `%`, `_`
/// and the escape character itself match literally.
#[must_use]
pub fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c.to_ascii_lowercase());
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Pagination
// =============================================================================

/// Largest page size any endpoint will honour.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    /// Build a request, clamping `page >= 0` and `1 <= size <= MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: page.max(0),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Build from a one-based page number.
    #[must_use]
    pub fn one_based(page_no: i64, size: i64) -> Self {
        Self::new(page_no.saturating_sub(1), size)
    }

    /// Row offset for `LIMIT ? OFFSET ?`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` rows.
    #[must_use]
    pub const fn total_pages(&self) -> i64 {
        (self.total + self.request.size - 1) / self.request.size
    }

    /// Whether a page after this one exists.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.request.page.saturating_add(1) < self.total_pages()
    }

    /// Transform the items, keeping the counts.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use secrecy::SecretString;

    use super::*;

    /// Fresh in-memory database with the schema applied.
    pub(crate) async fn test_pool() -> SqlitePool {
        let pool = create_pool(&SecretString::from("sqlite::memory:"))
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Phone"), "%phone%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b\\c"), "%a\\_b\\\\c%");
        assert_eq!(contains_pattern("ÄB"), "%Äb%");
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(-3, 0), PageRequest { page: 0, size: 1 });
        assert_eq!(PageRequest::new(2, 500).size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::one_based(1, 15).offset(), 0);
        assert_eq!(PageRequest::one_based(3, 15).offset(), 30);
    }

    #[test]
    fn test_page_request_extreme_pages() {
        let last = PageRequest::one_based(i64::MAX, 20);
        assert_eq!(last.page, i64::MAX - 1);
        assert_eq!(last.offset(), i64::MAX);
        assert_eq!(PageRequest::new(i64::MAX, MAX_PAGE_SIZE).offset(), i64::MAX);

        let first = PageRequest::one_based(i64::MIN, 20);
        assert_eq!(first, PageRequest { page: 0, size: 20 });
        assert_eq!(first.offset(), 0);

        let page: Page<i32> = Page {
            items: vec![],
            total: 3,
            request: PageRequest::new(i64::MAX, 10),
        };
        assert!(!page.has_more());
    }

    #[test]
    fn test_page_counts() {
        let page = Page {
            items: vec![1, 2],
            total: 21,
            request: PageRequest::new(0, 10),
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_more());

        let last = Page {
            items: vec![1],
            total: 21,
            request: PageRequest::new(2, 10),
        };
        assert!(!last.has_more());

        let empty: Page<i32> = Page {
            items: vec![],
            total: 0,
            request: PageRequest::new(0, 10),
        };
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_more());
    }

    #[tokio::test]
    async fn test_migrations_apply_cleanly() {
        let pool = test_pool().await;
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('goods', 'orders', 'api_mock')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 3);
    }
}
