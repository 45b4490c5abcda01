//! Orders and their line items.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mall_core::{Money, OrderId, OrderItemId, OrderStatus};

/// A placed order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[sqlx(try_from = "i64")]
    pub id: OrderId,
    pub order_no: String,
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub total_amount: Money,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub coupon_id: Option<i64>,
    #[sqlx(try_from = "String")]
    pub discount_amount: Money,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,
    pub receiver_address: Option<String>,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub payment_time: Option<DateTime<Utc>>,
    pub shipment_time: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
}

/// A line item copied from the cart when the order was placed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[sqlx(try_from = "i64")]
    pub id: OrderItemId,
    #[sqlx(try_from = "i64")]
    pub order_id: OrderId,
    pub goods_id: Option<i64>,
    pub goods_name: Option<String>,
    pub goods_image: Option<String>,
    #[sqlx(try_from = "String")]
    pub price: Money,
    pub quantity: i64,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// An order with its items, as the app renders it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub status_text: &'static str,
    pub items: Vec<OrderItem>,
}

impl OrderView {
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        let status_text = order.status.display_text();
        Self {
            order,
            status_text,
            items,
        }
    }
}
