//! Order placement and lifecycle.
//!
//! Placing an order turns the selected cart lines into order items, deletes
//! those lines and consumes the coupon in one transaction. Status changes go
//! through the transition methods on [`OrderStatus`].

use axum::extract::State;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mall_core::{AddressId, CouponId, Money, OrderId, OrderStatus, TransitionError};

use crate::db::orders::{NewOrder, NewOrderItem};
use crate::db::{
    AddressRepository, CartRepository, CouponRepository, OrderRepository, Page, PageRequest,
};
use crate::envelope::{ApiJson, ok};
use crate::error::{AppError, Result, missing};
use crate::extract::{Payload, lenient, user_or_guest};
use crate::models::order::OrderView;
use crate::models::{CartItem, Order};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;

const PLACEHOLDER_RECEIVER_NAME: &str = "收货人";
const PLACEHOLDER_RECEIVER_PHONE: &str = "13800138000";
const PLACEHOLDER_RECEIVER_ADDRESS: &str = "北京市朝阳区";

/// `ORD` + `yyyyMMddHHmmss` + four random digits.
#[must_use]
pub fn order_number(now: DateTime<Utc>) -> String {
    let suffix = rand::rng().random_range(0..10_000);
    format!("ORD{}{suffix:04}", now.format("%Y%m%d%H%M%S"))
}

/// Parse an optional status filter. Empty and `ALL` mean no filter.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unknown status name.
pub fn status_filter(status: Option<&str>) -> Result<Option<OrderStatus>> {
    match status.map(str::trim) {
        None | Some("" | "ALL") => Ok(None),
        Some(name) => name
            .parse()
            .map(Some)
            .map_err(|e: mall_core::ParseStatusError| AppError::BadRequest(e.to_string())),
    }
}

fn subtotal(items: &[CartItem]) -> Money {
    items
        .iter()
        .map(|item| Money::parse_or_zero(item.price.as_deref()).times(item.num))
        .sum()
}

fn order_item(item: &CartItem) -> NewOrderItem {
    NewOrderItem {
        goods_id: item.code.parse().ok(),
        goods_name: item.description.clone(),
        goods_image: item.img_url.clone(),
        price: Money::parse_or_zero(item.price.as_deref()),
        quantity: item.num,
        color: Some(item.color.clone()),
        size: Some(item.size.clone()),
    }
}

/// Attach items to each order.
pub(crate) async fn with_items(
    repo: &OrderRepository<'_>,
    orders: Vec<Order>,
) -> Result<Vec<OrderView>> {
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        let items = repo.items(order.id).await?;
        views.push(OrderView::new(order, items));
    }
    Ok(views)
}

/// Move an order to the status `step` yields, failing if another request got
/// there first.
pub(crate) async fn apply_transition(
    repo: &OrderRepository<'_>,
    order: &Order,
    step: fn(OrderStatus) -> std::result::Result<OrderStatus, TransitionError>,
) -> Result<OrderStatus> {
    let next = step(order.status)?;
    if !repo.transition(order.id, order.status, next).await? {
        return Err(AppError::Conflict(
            "Order status changed, please refresh".to_owned(),
        ));
    }
    tracing::info!(order_id = %order.id, from = %order.status, to = %next, "Order transitioned");
    Ok(next)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub coupon_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub address_id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub receiver_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub receiver_phone: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub receiver_address: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub remark: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub order_no: String,
    pub total_amount: Money,
}

struct Receiver {
    name: String,
    phone: String,
    address: String,
}

/// Fill receiver fields the request left out from the chosen address, the
/// default address or placeholders, in that order.
async fn resolve_receiver(
    state: &AppState,
    user_id: &str,
    body: &CreateRequest,
) -> Result<Receiver> {
    let given = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
    let (name, phone, address) = (
        given(&body.receiver_name),
        given(&body.receiver_phone),
        given(&body.receiver_address),
    );

    let fallback = if name.is_some() && phone.is_some() && address.is_some() {
        None
    } else {
        let repo = AddressRepository::new(state.pool());
        let chosen = match body.address_id {
            Some(id) => repo
                .get_by_id(AddressId::new(id))
                .await?
                .filter(|a| a.user_id == user_id),
            None => None,
        };
        match chosen {
            Some(address) => Some(address),
            None => repo.get_default(user_id).await?,
        }
    };

    Ok(Receiver {
        name: name
            .or_else(|| fallback.as_ref().map(|a| a.name.clone()))
            .unwrap_or_else(|| PLACEHOLDER_RECEIVER_NAME.to_owned()),
        phone: phone
            .or_else(|| fallback.as_ref().map(|a| a.phone.clone()))
            .unwrap_or_else(|| PLACEHOLDER_RECEIVER_PHONE.to_owned()),
        address: address
            .or_else(|| fallback.as_ref().map(crate::models::Address::full_address))
            .unwrap_or_else(|| PLACEHOLDER_RECEIVER_ADDRESS.to_owned()),
    })
}

/// Place an order from the selected cart lines.
#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn create(
    State(state): State<AppState>,
    Payload(body): Payload<CreateRequest>,
) -> Result<ApiJson<CreatedOrder>> {
    let user_id = user_or_guest(body.user_id.clone());
    let carts = CartRepository::new(state.pool());
    let cart = carts
        .find_cart(&user_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".to_owned()))?;
    let selected = carts.list_selected_items(cart.id).await?;
    if selected.is_empty() {
        return Err(AppError::BadRequest(
            "Select at least one item to order".to_owned(),
        ));
    }

    let subtotal = subtotal(&selected);
    let now = Utc::now();
    let coupon = match body.coupon_id {
        Some(id) => CouponRepository::new(state.pool())
            .get_by_id(CouponId::new(id))
            .await?
            .filter(|c| c.user_id == user_id && c.is_redeemable(now)),
        None => None,
    };
    let (coupon_id, discount_amount, total_amount) = match &coupon {
        Some(c) => (Some(c.id), c.amount, subtotal.saturating_sub(c.amount)),
        None => (None, Money::ZERO, subtotal),
    };

    let receiver = resolve_receiver(&state, &user_id, &body).await?;
    let order = OrderRepository::new(state.pool())
        .create(&NewOrder {
            order_no: order_number(now),
            user_id,
            total_amount,
            coupon_id,
            discount_amount,
            receiver_name: receiver.name,
            receiver_phone: receiver.phone,
            receiver_address: receiver.address,
            remark: body.remark.filter(|r| !r.is_empty()),
            items: selected.iter().map(order_item).collect(),
            cart_item_ids: selected.iter().map(|item| item.id).collect(),
        })
        .await?;

    tracing::info!(order_id = %order.id, order_no = %order.order_no, total = %total_amount, "Order placed");

    Ok(ok(CreatedOrder {
        order_id: order.id,
        order_no: order.order_no,
        total_amount,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub page: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub size: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub order_list: Vec<OrderView>,
    pub total_pages: i64,
    pub total_elements: i64,
    pub current_page: i64,
}

impl OrderPage {
    pub(crate) fn new(page: &Page<Order>, order_list: Vec<OrderView>) -> Self {
        Self {
            order_list,
            total_pages: page.total_pages(),
            total_elements: page.total,
            current_page: page.request.page,
        }
    }
}

/// The user's orders, newest first.
#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn list(
    State(state): State<AppState>,
    Payload(body): Payload<ListRequest>,
) -> Result<ApiJson<OrderPage>> {
    let status = status_filter(body.status.as_deref())?;
    let user_id = user_or_guest(body.user_id);
    let request = PageRequest::new(
        body.page.unwrap_or(0),
        body.size.unwrap_or(DEFAULT_PAGE_SIZE),
    );

    let repo = OrderRepository::new(state.pool());
    let mut page = repo.list(Some(&user_id), status, request).await?;
    let views = with_items(&repo, std::mem::take(&mut page.items)).await?;

    Ok(ok(OrderPage::new(&page, views)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub order_id: Option<i64>,
}

/// Load the order named in `body`, checking the caller owns it.
async fn owned_order(repo: &OrderRepository<'_>, body: OrderRequest) -> Result<Order> {
    let order_id = body.order_id.ok_or_else(|| missing("orderId"))?;
    let order = repo
        .get_by_id(OrderId::new(order_id))
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;
    if order.user_id != user_or_guest(body.user_id) {
        return Err(AppError::Forbidden(
            "Order belongs to another user".to_owned(),
        ));
    }
    Ok(order)
}

#[instrument(skip(state, body), fields(user_id = ?body.user_id, order_id = ?body.order_id))]
pub async fn detail(
    State(state): State<AppState>,
    Payload(body): Payload<OrderRequest>,
) -> Result<ApiJson<OrderView>> {
    let repo = OrderRepository::new(state.pool());
    let order = owned_order(&repo, body).await?;
    let items = repo.items(order.id).await?;

    Ok(ok(OrderView::new(order, items)))
}

/// Simulated payment.
#[instrument(skip(state, body), fields(user_id = ?body.user_id, order_id = ?body.order_id))]
pub async fn pay(
    State(state): State<AppState>,
    Payload(body): Payload<OrderRequest>,
) -> Result<ApiJson<&'static str>> {
    let repo = OrderRepository::new(state.pool());
    let order = owned_order(&repo, body).await?;
    apply_transition(&repo, &order, OrderStatus::pay).await?;

    Ok(ok("Payment successful"))
}

#[instrument(skip(state, body), fields(user_id = ?body.user_id, order_id = ?body.order_id))]
pub async fn confirm(
    State(state): State<AppState>,
    Payload(body): Payload<OrderRequest>,
) -> Result<ApiJson<&'static str>> {
    let repo = OrderRepository::new(state.pool());
    let order = owned_order(&repo, body).await?;
    apply_transition(&repo, &order, OrderStatus::confirm).await?;

    Ok(ok("Receipt confirmed"))
}

#[instrument(skip(state, body), fields(user_id = ?body.user_id, order_id = ?body.order_id))]
pub async fn cancel(
    State(state): State<AppState>,
    Payload(body): Payload<OrderRequest>,
) -> Result<ApiJson<&'static str>> {
    let repo = OrderRepository::new(state.pool());
    let order = owned_order(&repo, body).await?;
    apply_transition(&repo, &order, OrderStatus::cancel).await?;

    Ok(ok("Order cancelled"))
}

/// Delete a completed or cancelled order with its items.
#[instrument(skip(state, body), fields(user_id = ?body.user_id, order_id = ?body.order_id))]
pub async fn delete(
    State(state): State<AppState>,
    Payload(body): Payload<OrderRequest>,
) -> Result<ApiJson<&'static str>> {
    let repo = OrderRepository::new(state.pool());
    let order = owned_order(&repo, body).await?;
    if !order.status.is_deletable() {
        return Err(AppError::BadRequest(format!(
            "cannot delete an order that is {}",
            order.status
        )));
    }
    repo.delete(order.id).await?;

    Ok(ok("Order deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use mall_core::{CartId, CartItemId, StoreId};

    use super::*;

    fn line(price: Option<&str>, num: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(1),
            cart_id: CartId::new(1),
            store_id: StoreId::new(1),
            code: "42".to_owned(),
            img_url: None,
            description: Some("phone".to_owned()),
            price: price.map(str::to_owned),
            color: "default".to_owned(),
            size: "default".to_owned(),
            num,
            selected: true,
            saved: false,
            favorite: false,
            compare: false,
        }
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 8, 7, 6).unwrap();
        let no = order_number(now);
        assert_eq!(no.len(), 3 + 14 + 4);
        assert!(no.starts_with("ORD20250309080706"));
        assert!(no[17..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(status_filter(None).unwrap(), None);
        assert_eq!(status_filter(Some("")).unwrap(), None);
        assert_eq!(status_filter(Some("ALL")).unwrap(), None);
        assert_eq!(
            status_filter(Some("PENDING_PAYMENT")).unwrap(),
            Some(OrderStatus::PendingPayment)
        );
        assert_eq!(status_filter(Some("SHIPPED")).unwrap_err().code(), "400");
    }

    #[test]
    fn test_subtotal_treats_bad_prices_as_zero() {
        let items = [line(Some("19.90"), 2), line(None, 3), line(Some("abc"), 1)];
        assert_eq!(subtotal(&items).to_fixed(), "39.80");
    }

    #[test]
    fn test_order_item_copies_line() {
        let item = order_item(&line(Some("5"), 4));
        assert_eq!(item.goods_id, Some(42));
        assert_eq!(item.goods_name.as_deref(), Some("phone"));
        assert_eq!(item.price.to_fixed(), "5.00");
        assert_eq!(item.quantity, 4);
    }
}
