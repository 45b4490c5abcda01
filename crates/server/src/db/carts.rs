//! Cart, cart item and store persistence.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use mall_core::{CartId, CartItemId, StoreId};

use super::RepositoryError;
use crate::models::cart::ItemFlags;
use crate::models::{Cart, CartItem, Store};

const ITEM_COLUMNS: &str = "id, cart_id, store_id, code, img_url, description, price, color, \
     size, num, selected, saved, favorite, compare";

/// Fields for a new cart line.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub store_id: StoreId,
    pub code: String,
    pub img_url: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub color: String,
    pub size: String,
    pub num: i64,
    pub flags: ItemFlags,
}

/// Repository for carts and their items.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Carts
    // =========================================================================

    /// Find the cart belonging to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_cart(&self, user_id: &str) -> Result<Option<Cart>, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at FROM cart WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(cart)
    }

    /// Find or lazily create the cart belonging to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create_cart(&self, user_id: &str) -> Result<Cart, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_cart_in(&mut conn, user_id).await
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// Find a store by its code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_store(&self, store_code: &str) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(
            "SELECT id, store_name, store_code, h5url FROM store WHERE store_code = ?",
        )
        .bind(store_code)
        .fetch_optional(self.pool)
        .await?;

        Ok(store)
    }

    /// Find a store by code, creating it with the given name and link if absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create_store(
        &self,
        store_code: &str,
        store_name: &str,
        h5url: Option<&str>,
    ) -> Result<Store, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_store_in(&mut conn, store_code, store_name, h5url).await
    }

    /// All stores by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(
            "SELECT id, store_name, store_code, h5url FROM store ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }

    /// Count stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_stores(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Items of a cart in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let items = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_item WHERE cart_id = ? ORDER BY id"
        ))
        .bind(cart_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Selected items of a cart in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_selected_items(
        &self,
        cart_id: CartId,
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let items = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_item WHERE cart_id = ? AND selected = 1 ORDER BY id"
        ))
        .bind(cart_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Get an item together with the user id owning its cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item_with_owner(
        &self,
        id: CartItemId,
    ) -> Result<Option<(CartItem, String)>, RepositoryError> {
        let Some(item) = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_item WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let owner: String = sqlx::query_scalar("SELECT user_id FROM cart WHERE id = ?")
            .bind(item.cart_id.as_i64())
            .fetch_one(self.pool)
            .await?;

        Ok(Some((item, owner)))
    }

    /// Find the line for the same goods variant in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_variant(
        &self,
        cart_id: CartId,
        code: &str,
        color: &str,
        size: &str,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_item \
             WHERE cart_id = ? AND code = ? AND color = ? AND size = ? \
             ORDER BY id LIMIT 1"
        ))
        .bind(cart_id.as_i64())
        .bind(code)
        .bind(color)
        .bind(size)
        .fetch_optional(self.pool)
        .await?;

        Ok(item)
    }

    /// Insert a cart line, returning its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        item: &NewCartItem,
    ) -> Result<CartItemId, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        add_item_in(&mut conn, cart_id, item).await
    }

    /// Write back the quantity and flags of a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_item(&self, item: &CartItem) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE cart_item
            SET num = ?, selected = ?, saved = ?, favorite = ?, compare = ?
            WHERE id = ?
            ",
        )
        .bind(item.num)
        .bind(item.selected)
        .bind(item.saved)
        .bind(item.favorite)
        .bind(item.compare)
        .bind(item.id.as_i64())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_item(&self, id: CartItemId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_item WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete the listed lines that belong to `cart_id`, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_items_in_cart(
        &self,
        cart_id: CartId,
        ids: &[CartItemId],
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;
        for id in ids {
            removed += sqlx::query("DELETE FROM cart_item WHERE id = ? AND cart_id = ?")
                .bind(id.as_i64())
                .bind(cart_id.as_i64())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        Ok(removed)
    }

    /// Set `selected` on every line of a cart, optionally limited to one store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_selected(
        &self,
        cart_id: CartId,
        store_id: Option<StoreId>,
        selected: bool,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE cart_item SET selected = ?1 WHERE cart_id = ?2 AND (?3 IS NULL OR store_id = ?3)",
        )
        .bind(selected)
        .bind(cart_id.as_i64())
        .bind(store_id.map(|s| s.as_i64()))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    /// Delete every line of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_item WHERE cart_id = ?")
            .bind(cart_id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every cart and cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear_all(&self) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cart_item").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM cart").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Count all cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_items(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_item")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Connection-level writes
// =============================================================================

/// [`CartRepository::get_or_create_cart`] on a caller-held connection or
/// transaction.
pub(crate) async fn get_or_create_cart_in(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Cart, RepositoryError> {
    sqlx::query("INSERT INTO cart (user_id, created_at) VALUES (?, ?) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    sqlx::query_as::<_, Cart>("SELECT id, user_id, created_at FROM cart WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| RepositoryError::DataCorruption(format!("cart for {user_id} vanished")))
}

/// [`CartRepository::get_or_create_store`] on a caller-held connection or
/// transaction.
pub(crate) async fn get_or_create_store_in(
    conn: &mut SqliteConnection,
    store_code: &str,
    store_name: &str,
    h5url: Option<&str>,
) -> Result<Store, RepositoryError> {
    sqlx::query(
        "INSERT INTO store (store_name, store_code, h5url) VALUES (?, ?, ?) \
         ON CONFLICT (store_code) DO NOTHING",
    )
    .bind(store_name)
    .bind(store_code)
    .bind(h5url)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, Store>(
        "SELECT id, store_name, store_code, h5url FROM store WHERE store_code = ?",
    )
    .bind(store_code)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| RepositoryError::DataCorruption(format!("store {store_code} vanished")))
}

/// [`CartRepository::add_item`] on a caller-held connection or transaction.
pub(crate) async fn add_item_in(
    conn: &mut SqliteConnection,
    cart_id: CartId,
    item: &NewCartItem,
) -> Result<CartItemId, RepositoryError> {
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO cart_item (
            cart_id, store_id, code, img_url, description, price, color, size, num,
            selected, saved, favorite, compare
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(cart_id.as_i64())
    .bind(item.store_id.as_i64())
    .bind(&item.code)
    .bind(&item.img_url)
    .bind(&item.description)
    .bind(&item.price)
    .bind(&item.color)
    .bind(&item.size)
    .bind(item.num)
    .bind(item.flags.selected)
    .bind(item.flags.saved)
    .bind(item.flags.favorite)
    .bind(item.flags.compare)
    .fetch_one(&mut *conn)
    .await?;

    Ok(CartItemId::new(id))
}
