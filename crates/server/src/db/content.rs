//! Home and mine page content.

use sqlx::{SqliteConnection, SqlitePool};

use super::RepositoryError;
use crate::models::{Banner, MenuEntry, Tab};

/// Tables holding icon menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTable {
    /// The home page nine-grid.
    HomeNineMenu,
    /// The mine page function list.
    MineFunction,
}

impl MenuTable {
    const fn name(self) -> &'static str {
        match self {
            Self::HomeNineMenu => "home_nine_menu",
            Self::MineFunction => "mine_function",
        }
    }
}

/// Tables holding tab strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabTable {
    Home,
    Mine,
}

impl TabTable {
    const fn name(self) -> &'static str {
        match self {
            Self::Home => "home_tab",
            Self::Mine => "mine_tab",
        }
    }
}

/// Repository for page content tables.
pub struct ContentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ContentRepository<'a> {
    /// Create a new content repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Home banners in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn banners(&self) -> Result<Vec<Banner>, RepositoryError> {
        let banners =
            sqlx::query_as::<_, Banner>("SELECT id, img_url, type FROM home_banner ORDER BY id")
                .fetch_all(self.pool)
                .await?;
        Ok(banners)
    }

    /// Menu entries of `table` in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn menus(&self, table: MenuTable) -> Result<Vec<MenuEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, MenuEntry>(&format!(
            "SELECT id, menu_icon, menu_name, menu_code, h5url FROM {} ORDER BY id",
            table.name()
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }

    /// Tabs of `table` in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tabs(&self, table: TabTable) -> Result<Vec<Tab>, RepositoryError> {
        let tabs = sqlx::query_as::<_, Tab>(&format!(
            "SELECT id, name, code FROM {} ORDER BY id",
            table.name()
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(tabs)
    }

    /// Whether the home tables hold any content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_home_content(&self) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM home_banner) \
                  + (SELECT COUNT(*) FROM home_nine_menu) \
                  + (SELECT COUNT(*) FROM home_tab)",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Whether the mine tables hold any content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_mine_content(&self) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM mine_function) + (SELECT COUNT(*) FROM mine_tab)",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(count > 0)
    }
}

// =============================================================================
// Fixture writes
// =============================================================================

/// Insert a banner.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub(crate) async fn add_banner_in(
    conn: &mut SqliteConnection,
    img_url: Option<&str>,
    kind: Option<&str>,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO home_banner (img_url, type) VALUES (?, ?)")
        .bind(img_url)
        .bind(kind)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Insert a menu entry into `table`.
pub(crate) async fn add_menu_in(
    conn: &mut SqliteConnection,
    table: MenuTable,
    entry: &MenuEntry,
) -> Result<(), RepositoryError> {
    sqlx::query(&format!(
        "INSERT INTO {} (menu_icon, menu_name, menu_code, h5url) VALUES (?, ?, ?, ?)",
        table.name()
    ))
    .bind(&entry.menu_icon)
    .bind(&entry.menu_name)
    .bind(&entry.menu_code)
    .bind(&entry.h5url)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert a tab into `table`.
pub(crate) async fn add_tab_in(
    conn: &mut SqliteConnection,
    table: TabTable,
    name: Option<&str>,
    code: Option<&str>,
) -> Result<(), RepositoryError> {
    sqlx::query(&format!(
        "INSERT INTO {} (name, code) VALUES (?, ?)",
        table.name()
    ))
    .bind(name)
    .bind(code)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;

    #[tokio::test]
    async fn test_menus_are_kept_per_table() {
        let pool = test_pool().await;
        let repo = ContentRepository::new(&pool);
        assert!(!repo.has_mine_content().await.unwrap());

        let entry = MenuEntry {
            id: 0,
            menu_icon: Some("icon.png".to_owned()),
            menu_name: Some("Orders".to_owned()),
            menu_code: Some("order".to_owned()),
            h5url: None,
        };
        {
            let mut conn = pool.acquire().await.unwrap();
            add_menu_in(&mut conn, MenuTable::MineFunction, &entry)
                .await
                .unwrap();
            add_tab_in(&mut conn, TabTable::Mine, Some("All"), Some("all"))
                .await
                .unwrap();
        }

        assert!(repo.has_mine_content().await.unwrap());
        assert!(!repo.has_home_content().await.unwrap());
        assert!(repo.menus(MenuTable::HomeNineMenu).await.unwrap().is_empty());

        let menus = repo.menus(MenuTable::MineFunction).await.unwrap();
        assert_eq!(menus[0].menu_name.as_deref(), Some("Orders"));
        assert_eq!(repo.tabs(TabTable::Mine).await.unwrap().len(), 1);
    }
}
