//! User coupons.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mall_core::{CouponId, CouponStatus, CouponType, Money};

/// A coupon issued to a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[sqlx(try_from = "i64")]
    pub id: CouponId,
    pub user_id: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub amount: Money,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub kind: CouponType,
    #[sqlx(try_from = "String")]
    pub min_order_amount: Money,
    #[sqlx(try_from = "String")]
    pub status: CouponStatus,
    pub expire_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Whether the coupon can still be redeemed at `now`.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status == CouponStatus::Unused && self.expire_at > now
    }

    /// Whether the coupon is unused but past its expiry.
    #[must_use]
    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == CouponStatus::Unused && self.expire_at <= now
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn coupon(status: CouponStatus, expires_in: Duration) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            user_id: "guest".to_owned(),
            name: "test".to_owned(),
            amount: Money::from_cents(500),
            kind: CouponType::NoThreshold,
            min_order_amount: Money::ZERO,
            status,
            expire_at: now + expires_in,
            created_at: now,
        }
    }

    #[test]
    fn test_redeemable() {
        let now = Utc::now();
        assert!(coupon(CouponStatus::Unused, Duration::days(1)).is_redeemable(now));
        assert!(!coupon(CouponStatus::Used, Duration::days(1)).is_redeemable(now));
        assert!(!coupon(CouponStatus::Unused, Duration::days(-1)).is_redeemable(now));
    }

    #[test]
    fn test_lapsed() {
        let now = Utc::now();
        assert!(coupon(CouponStatus::Unused, Duration::days(-1)).has_lapsed(now));
        assert!(!coupon(CouponStatus::Used, Duration::days(-1)).has_lapsed(now));
        assert!(!coupon(CouponStatus::Unused, Duration::days(1)).has_lapsed(now));
    }
}
