//! Coupon persistence.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use mall_core::{CouponId, CouponStatus, CouponType, Money};

use super::RepositoryError;
use crate::models::Coupon;

const COUPON_COLUMNS: &str =
    "id, user_id, name, amount, type, min_order_amount, status, expire_at, created_at";

/// A coupon about to be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    pub name: String,
    pub amount: Money,
    pub kind: CouponType,
    pub min_order_amount: Money,
    pub expire_at: DateTime<Utc>,
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// A user's coupons in issue order, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: &str,
        status: Option<CouponStatus>,
    ) -> Result<Vec<Coupon>, RepositoryError> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupon \
             WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2) ORDER BY id"
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(self.pool)
        .await?;

        Ok(coupons)
    }

    /// Count a user's coupons of any status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: &str) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupon WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Get a coupon by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupon WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(coupon)
    }

    /// Issue coupons to a user in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    pub async fn issue(
        &self,
        user_id: &str,
        coupons: &[NewCoupon],
    ) -> Result<Vec<Coupon>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let mut issued = Vec::with_capacity(coupons.len());
        for coupon in coupons {
            let row = sqlx::query_as::<_, Coupon>(&format!(
                "INSERT INTO coupon (user_id, name, amount, type, min_order_amount, status, expire_at, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
                 RETURNING {COUPON_COLUMNS}"
            ))
            .bind(user_id)
            .bind(&coupon.name)
            .bind(coupon.amount.to_fixed())
            .bind(coupon.kind.as_str())
            .bind(coupon.min_order_amount.to_fixed())
            .bind(CouponStatus::Unused.as_str())
            .bind(coupon.expire_at)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            issued.push(row);
        }
        tx.commit().await?;

        Ok(issued)
    }

    /// UNUSED coupons of a user, in issue order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_unused(&self, user_id: &str) -> Result<Vec<Coupon>, RepositoryError> {
        self.list(user_id, Some(CouponStatus::Unused)).await
    }

    /// Set a coupon's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_status(&self, id: CouponId, status: CouponStatus) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE coupon SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Mark a coupon USED. Returns `false` if it was no longer UNUSED.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn consume(&self, id: CouponId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(CONSUME_SQL)
            .bind(CouponStatus::Used.as_str())
            .bind(id.as_i64())
            .bind(CouponStatus::Unused.as_str())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

const CONSUME_SQL: &str = "UPDATE coupon SET status = ? WHERE id = ? AND status = ?";

/// Mark a coupon USED inside an order transaction. Returns `false` if it was
/// no longer UNUSED.
pub(crate) async fn consume_in(
    tx: &mut Transaction<'_, Sqlite>,
    id: CouponId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(CONSUME_SQL)
        .bind(CouponStatus::Used.as_str())
        .bind(id.as_i64())
        .bind(CouponStatus::Unused.as_str())
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() == 1)
}
