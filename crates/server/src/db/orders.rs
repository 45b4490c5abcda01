//! Order persistence.

use chrono::Utc;
use sqlx::SqlitePool;

use mall_core::{CartItemId, CouponId, Money, OrderId, OrderStatus};

use super::{Page, PageRequest, RepositoryError, coupons, map_unique_violation};
use crate::models::{Order, OrderItem};

const ORDER_COLUMNS: &str = "id, order_no, user_id, total_amount, status, coupon_id, \
     discount_amount, receiver_name, receiver_phone, receiver_address, remark, created_at, \
     payment_time, shipment_time, completed_time";

const ITEM_COLUMNS: &str =
    "id, order_id, goods_id, goods_name, goods_image, price, quantity, color, size";

/// An order to be placed, with everything the checkout transaction touches.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_no: String,
    pub user_id: String,
    pub total_amount: Money,
    pub coupon_id: Option<CouponId>,
    pub discount_amount: Money,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub remark: Option<String>,
    pub items: Vec<NewOrderItem>,
    /// Cart lines consumed by this order.
    pub cart_item_ids: Vec<CartItemId>,
}

/// A line copied from the cart.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub goods_id: Option<i64>,
    pub goods_name: Option<String>,
    pub goods_image: Option<String>,
    pub price: Money,
    pub quantity: i64,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Place an order.
    ///
    /// Inserts the order and its items, deletes the consumed cart lines and
    /// marks the coupon USED, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number is taken or the
    /// coupon was used concurrently.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (order_no, user_id, total_amount, status, coupon_id, discount_amount, \
                 receiver_name, receiver_phone, receiver_address, remark, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&order.order_no)
        .bind(&order.user_id)
        .bind(order.total_amount.to_fixed())
        .bind(OrderStatus::PendingPayment.as_str())
        .bind(order.coupon_id.map(|id| id.as_i64()))
        .bind(order.discount_amount.to_fixed())
        .bind(&order.receiver_name)
        .bind(&order.receiver_phone)
        .bind(&order.receiver_address)
        .bind(&order.remark)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "order number"))?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO order_item (order_id, goods_id, goods_name, goods_image, price, quantity, color, size)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(created.id.as_i64())
            .bind(item.goods_id)
            .bind(&item.goods_name)
            .bind(&item.goods_image)
            .bind(item.price.to_fixed())
            .bind(item.quantity)
            .bind(&item.color)
            .bind(&item.size)
            .execute(&mut *tx)
            .await?;
        }

        for id in &order.cart_item_ids {
            sqlx::query("DELETE FROM cart_item WHERE id = ?")
                .bind(id.as_i64())
                .execute(&mut *tx)
                .await?;
        }

        if let Some(coupon_id) = order.coupon_id
            && !coupons::consume_in(&mut tx, coupon_id).await?
        {
            return Err(RepositoryError::Conflict(format!(
                "coupon {coupon_id} is no longer available"
            )));
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Items of an order in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_item WHERE order_id = ? ORDER BY id"
        ))
        .bind(order_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// One page of orders, newest first. `user_id` and `status` narrow the
    /// result when given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: Option<&str>,
        status: Option<OrderStatus>,
        request: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        const FILTER: &str = "(?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR status = ?2)";
        let status = status.map(|s| s.as_str());

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders WHERE {FILTER}"))
                .bind(user_id)
                .bind(status)
                .fetch_one(self.pool)
                .await?;

        let items = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT ?3 OFFSET ?4"
        ))
        .bind(user_id)
        .bind(status)
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

    /// Persist a status change and its timestamp, provided the order is still
    /// in `from`. Returns whether the row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let stamp_column = match to {
            OrderStatus::PendingShipment => Some("payment_time"),
            OrderStatus::PendingReceipt => Some("shipment_time"),
            OrderStatus::Completed => Some("completed_time"),
            OrderStatus::PendingPayment | OrderStatus::Cancelled => None,
        };
        let sql = match stamp_column {
            Some(column) => {
                format!("UPDATE orders SET status = ?1, {column} = ?4 WHERE id = ?2 AND status = ?3")
            }
            None => "UPDATE orders SET status = ?1 WHERE id = ?2 AND status = ?3".to_owned(),
        };

        let mut query = sqlx::query(&sql)
            .bind(to.as_str())
            .bind(id.as_i64())
            .bind(from.as_str());
        if stamp_column.is_some() {
            query = query.bind(Utc::now());
        }
        let result = query.execute(self.pool).await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete an order and its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM order_item WHERE order_id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Count all orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Order count per status, zero-filled for every known status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(self.pool)
                .await?;

        let mut counts: Vec<(OrderStatus, i64)> =
            OrderStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for (status, count) in rows {
            let status: OrderStatus = status
                .parse()
                .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;
            if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == status) {
                entry.1 = count;
            }
        }

        Ok(counts)
    }

    /// Sum of `total_amount` over every order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored amount is invalid.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_revenue(&self) -> Result<Money, RepositoryError> {
        let amounts: Vec<String> = sqlx::query_scalar("SELECT total_amount FROM orders")
            .fetch_all(self.pool)
            .await?;

        amounts
            .iter()
            .map(|a| Money::parse(a).map_err(|e| RepositoryError::DataCorruption(e.to_string())))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;

    fn new_order(no: &str, user: &str, cents: i64) -> NewOrder {
        NewOrder {
            order_no: no.to_owned(),
            user_id: user.to_owned(),
            total_amount: Money::from_cents(cents),
            coupon_id: None,
            discount_amount: Money::ZERO,
            receiver_name: "name".to_owned(),
            receiver_phone: "13800138000".to_owned(),
            receiver_address: "addr".to_owned(),
            remark: None,
            items: vec![NewOrderItem {
                goods_id: Some(1),
                goods_name: Some("thing".to_owned()),
                goods_image: None,
                price: Money::from_cents(cents),
                quantity: 1,
                color: None,
                size: None,
            }],
            cart_item_ids: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_list_and_items() {
        let pool = test_pool().await;
        let repo = OrderRepository::new(&pool);
        let first = repo.create(&new_order("ORD1", "u1", 1000)).await.unwrap();
        let second = repo.create(&new_order("ORD2", "u1", 2550)).await.unwrap();
        repo.create(&new_order("ORD3", "u2", 100)).await.unwrap();

        assert_eq!(first.status, OrderStatus::PendingPayment);
        let page = repo
            .list(Some("u1"), None, PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].id, second.id);

        let items = repo.items(first.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price.to_fixed(), "10.00");

        assert_eq!(repo.total_revenue().await.unwrap().to_fixed(), "36.50");
    }

    #[tokio::test]
    async fn test_duplicate_order_number_conflicts() {
        let pool = test_pool().await;
        let repo = OrderRepository::new(&pool);
        repo.create(&new_order("ORD1", "u1", 1)).await.unwrap();
        let err = repo.create(&new_order("ORD1", "u1", 1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_transition_sets_timestamp_once() {
        let pool = test_pool().await;
        let repo = OrderRepository::new(&pool);
        let order = repo.create(&new_order("ORD1", "u1", 1)).await.unwrap();

        assert!(
            repo.transition(order.id, OrderStatus::PendingPayment, OrderStatus::PendingShipment)
                .await
                .unwrap()
        );
        assert!(
            !repo
                .transition(order.id, OrderStatus::PendingPayment, OrderStatus::PendingShipment)
                .await
                .unwrap()
        );

        let paid = repo.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(paid.status, OrderStatus::PendingShipment);
        assert!(paid.payment_time.is_some());
        assert!(paid.shipment_time.is_none());

        let counts = repo.count_by_status().await.unwrap();
        assert!(counts.contains(&(OrderStatus::PendingShipment, 1)));
        assert!(counts.contains(&(OrderStatus::Completed, 0)));

        repo.delete(order.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.items(order.id).await.unwrap().is_empty());
    }
}
