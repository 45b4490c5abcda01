//! Shipping address persistence.
//!
//! Every mutation that touches `is_default` runs in a transaction so a user
//! never ends up with two default addresses.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use mall_core::AddressId;

use super::RepositoryError;
use crate::models::Address;

const ADDRESS_COLUMNS: &str =
    "id, user_id, name, phone, region, detail, is_default, label, created_at";

/// Editable address fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub name: String,
    pub phone: String,
    pub region: String,
    pub detail: String,
    pub label: String,
}

/// Repository for user addresses.
pub struct AddressRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// A user's addresses, default first, then newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_address WHERE user_id = ? \
             ORDER BY is_default DESC, created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Get an address by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_address WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(address)
    }

    /// The user's default address, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_default(&self, user_id: &str) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_address \
             WHERE user_id = ? AND is_default = 1 ORDER BY id LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(address)
    }

    /// Insert an address. A default address replaces the user's previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: &str,
        fields: &AddressFields,
        is_default: bool,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if is_default {
            clear_default(&mut tx, user_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO user_address (user_id, name, phone, region, detail, is_default, label, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.region)
        .bind(&fields.detail)
        .bind(is_default)
        .bind(&fields.label)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    /// Persist an edited address. When it is the default, every other address
    /// of the user loses the flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, address: &Address) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if address.is_default {
            clear_default(&mut tx, &address.user_id).await?;
        }

        sqlx::query(
            r"
            UPDATE user_address
            SET name = ?, phone = ?, region = ?, detail = ?, is_default = ?, label = ?
            WHERE id = ?
            ",
        )
        .bind(&address.name)
        .bind(&address.phone)
        .bind(&address.region)
        .bind(&address.detail)
        .bind(address.is_default)
        .bind(&address.label)
        .bind(address.id.as_i64())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete an address. If it was the default, the user's most recent
    /// remaining address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, address: &Address) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM user_address WHERE id = ?")
            .bind(address.id.as_i64())
            .execute(&mut *tx)
            .await?;

        if address.is_default {
            sqlx::query(
                r"
                UPDATE user_address SET is_default = 1
                WHERE id = (
                    SELECT id FROM user_address
                    WHERE user_id = ?
                    ORDER BY created_at DESC, id DESC
                    LIMIT 1
                )
                ",
            )
            .bind(&address.user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Make `address` the user's only default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_default(&self, address: &Address) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        clear_default(&mut tx, &address.user_id).await?;
        sqlx::query("UPDATE user_address SET is_default = 1 WHERE id = ?")
            .bind(address.id.as_i64())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn clear_default(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE user_address SET is_default = 0 WHERE user_id = ? AND is_default = 1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
