//! Coupon wallet: listing, receiving and redeeming red packets.

use axum::extract::State;
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use tracing::instrument;

use mall_core::{CouponId, CouponStatus, CouponType, Money};

use crate::db::CouponRepository;
use crate::db::coupons::NewCoupon;
use crate::envelope::{ApiJson, ok};
use crate::error::{AppError, Result, missing};
use crate::extract::{Payload, lenient, user_or_guest};
use crate::models::Coupon;
use crate::state::AppState;

/// Days until a newly issued coupon expires.
const COUPON_VALIDITY_DAYS: i64 = 30;

/// Bounds of a received coupon, in cents.
const RECEIVE_MIN_CENTS: i64 = 200;
const RECEIVE_MAX_CENTS: i64 = 2000;

fn demo_coupons() -> Vec<NewCoupon> {
    let expire_at = Utc::now() + Duration::days(COUPON_VALIDITY_DAYS);
    vec![
        NewCoupon {
            name: "无门槛红包".to_owned(),
            amount: Money::from_cents(1500),
            kind: CouponType::NoThreshold,
            min_order_amount: Money::ZERO,
            expire_at,
        },
        NewCoupon {
            name: "限时购物红包".to_owned(),
            amount: Money::from_cents(500),
            kind: CouponType::Threshold,
            min_order_amount: Money::from_cents(10_000),
            expire_at,
        },
        NewCoupon {
            name: "新客专享红包".to_owned(),
            amount: Money::from_cents(295),
            kind: CouponType::NoThreshold,
            min_order_amount: Money::ZERO,
            expire_at,
        },
    ]
}

/// Issue the demo coupons to a user who has never had any.
async fn ensure_demo_coupons(repo: &CouponRepository<'_>, user_id: &str) -> Result<()> {
    if repo.count_for_user(user_id).await? == 0 {
        repo.issue(user_id, &demo_coupons()).await?;
        tracing::info!(user_id, "Issued demo coupons");
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub status: Option<String>,
}

/// The user's coupons, optionally filtered by status.
#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn list(
    State(state): State<AppState>,
    Payload(body): Payload<ListRequest>,
) -> Result<ApiJson<Vec<Coupon>>> {
    let status = body
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<CouponStatus>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let repo = CouponRepository::new(state.pool());
    let user_id = user_or_guest(body.user_id);
    ensure_demo_coupons(&repo, &user_id).await?;

    Ok(ok(repo.list(&user_id, status).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
}

/// Issue one no-threshold coupon worth a random 2.00 to 20.00.
#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn receive(
    State(state): State<AppState>,
    Payload(body): Payload<UserRequest>,
) -> Result<ApiJson<Coupon>> {
    let cents = rand::rng().random_range(RECEIVE_MIN_CENTS..=RECEIVE_MAX_CENTS);
    let coupon = NewCoupon {
        name: "限时购物红包".to_owned(),
        amount: Money::from_cents(cents),
        kind: CouponType::NoThreshold,
        min_order_amount: Money::ZERO,
        expire_at: Utc::now() + Duration::days(COUPON_VALIDITY_DAYS),
    };

    let user_id = user_or_guest(body.user_id);
    let issued = CouponRepository::new(state.pool())
        .issue(&user_id, std::slice::from_ref(&coupon))
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("coupon insert returned no row".to_owned()))?;

    Ok(ok(issued))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AvailableRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::money")]
    pub order_amount: Option<Money>,
}

/// Coupons usable on an order of `orderAmount`.
#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn available(
    State(state): State<AppState>,
    Payload(body): Payload<AvailableRequest>,
) -> Result<ApiJson<Vec<Coupon>>> {
    let repo = CouponRepository::new(state.pool());
    let user_id = user_or_guest(body.user_id);
    ensure_demo_coupons(&repo, &user_id).await?;

    let order_amount = body.order_amount.unwrap_or(Money::ZERO);
    let now = Utc::now();
    let coupons = repo
        .list_unused(&user_id)
        .await?
        .into_iter()
        .filter(|c| c.is_redeemable(now) && c.min_order_amount <= order_amount)
        .collect();

    Ok(ok(coupons))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedeemRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub coupon_id: Option<i64>,
}

/// Mark a coupon used outside of checkout.
#[instrument(skip(state, body), fields(user_id = ?body.user_id, coupon_id = ?body.coupon_id))]
pub async fn redeem(
    State(state): State<AppState>,
    Payload(body): Payload<RedeemRequest>,
) -> Result<ApiJson<&'static str>> {
    let coupon_id = CouponId::new(body.coupon_id.ok_or_else(|| missing("couponId"))?);
    let repo = CouponRepository::new(state.pool());
    let coupon = repo
        .get_by_id(coupon_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coupon not found".to_owned()))?;

    if coupon.user_id != user_or_guest(body.user_id) {
        return Err(AppError::Forbidden(
            "Coupon belongs to another user".to_owned(),
        ));
    }
    if coupon.has_lapsed(Utc::now()) {
        repo.set_status(coupon.id, CouponStatus::Expired).await?;
        return Err(AppError::BadRequest("Coupon has expired".to_owned()));
    }
    if coupon.status != CouponStatus::Unused || !repo.consume(coupon.id).await? {
        return Err(AppError::BadRequest(
            "Coupon is already used or expired".to_owned(),
        ));
    }

    Ok(ok("Coupon redeemed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_coupons() {
        let coupons = demo_coupons();
        let amounts: Vec<String> = coupons.iter().map(|c| c.amount.to_fixed()).collect();
        assert_eq!(amounts, ["15.00", "5.00", "2.95"]);
        assert_eq!(coupons[1].kind, CouponType::Threshold);
        assert_eq!(coupons[1].min_order_amount.to_fixed(), "100.00");
        assert!(coupons.iter().all(|c| c.expire_at > Utc::now()));
    }
}
