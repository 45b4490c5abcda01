//! Status enums for various entities.
//!
//! Statuses are stored as their `SCREAMING_SNAKE_CASE` names (the same text the
//! JSON API uses), so every enum here round-trips through `Display`/`FromStr`.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or client-supplied status name is unknown.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    /// Which status type was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display`, `FromStr` and `TryFrom<String>` from a single
/// name table.
macro_rules! status_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// The stored/serialized name of this status.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ParseStatusError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }
    };
}

// =============================================================================
// Orders
// =============================================================================

/// Error returned when an order action is not allowed from its current status.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot {action} an order that is {from}")]
pub struct TransitionError {
    /// The attempted action.
    pub action: &'static str,
    /// The status the order was in.
    pub from: OrderStatus,
}

/// Order lifecycle.
///
/// ```text
/// PENDING_PAYMENT -> PENDING_SHIPMENT -> PENDING_RECEIPT -> COMPLETED
///        \________________\__________________\-----> CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    PendingPayment,
    PendingShipment,
    PendingReceipt,
    Completed,
    Cancelled,
}

status_names!(OrderStatus, "order status", {
    PendingPayment => "PENDING_PAYMENT",
    PendingShipment => "PENDING_SHIPMENT",
    PendingReceipt => "PENDING_RECEIPT",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::PendingPayment,
        Self::PendingShipment,
        Self::PendingReceipt,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Label shown by the app.
    #[must_use]
    pub const fn display_text(&self) -> &'static str {
        match self {
            Self::PendingPayment => "待付款",
            Self::PendingShipment => "待发货",
            Self::PendingReceipt => "待收货",
            Self::Completed => "已完成",
            Self::Cancelled => "已取消",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the order may be deleted by its owner.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        self.is_terminal()
    }

    /// `PENDING_PAYMENT -> PENDING_SHIPMENT`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] from any other status.
    pub const fn pay(self) -> Result<Self, TransitionError> {
        match self {
            Self::PendingPayment => Ok(Self::PendingShipment),
            from => Err(TransitionError { action: "pay", from }),
        }
    }

    /// `PENDING_SHIPMENT -> PENDING_RECEIPT`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] from any other status.
    pub const fn ship(self) -> Result<Self, TransitionError> {
        match self {
            Self::PendingShipment => Ok(Self::PendingReceipt),
            from => Err(TransitionError {
                action: "ship",
                from,
            }),
        }
    }

    /// `PENDING_RECEIPT -> COMPLETED`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] from any other status.
    pub const fn confirm(self) -> Result<Self, TransitionError> {
        match self {
            Self::PendingReceipt => Ok(Self::Completed),
            from => Err(TransitionError {
                action: "confirm",
                from,
            }),
        }
    }

    /// Any non-terminal status `-> CANCELLED`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the order is already completed or cancelled.
    pub const fn cancel(self) -> Result<Self, TransitionError> {
        if self.is_terminal() {
            Err(TransitionError {
                action: "cancel",
                from: self,
            })
        } else {
            Ok(Self::Cancelled)
        }
    }
}

// =============================================================================
// Coupons
// =============================================================================

/// Coupon redemption status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponStatus {
    #[default]
    Unused,
    Used,
    Expired,
}

status_names!(CouponStatus, "coupon status", {
    Unused => "UNUSED",
    Used => "USED",
    Expired => "EXPIRED",
});

/// Coupon kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponType {
    /// Applies to any order.
    #[default]
    NoThreshold,
    /// Needs a minimum order amount.
    Threshold,
}

status_names!(CouponType, "coupon type", {
    NoThreshold => "NO_THRESHOLD",
    Threshold => "THRESHOLD",
});

// =============================================================================
// Catalog & users
// =============================================================================

/// Whether goods are listed to customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoodsStatus {
    #[default]
    Active,
    Inactive,
}

status_names!(GoodsStatus, "goods status", {
    Active => "ACTIVE",
    Inactive => "INACTIVE",
});

impl GoodsStatus {
    /// The other status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

/// Whether a user may log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Disabled,
}

status_names!(UserStatus, "user status", {
    Active => "ACTIVE",
    Disabled => "DISABLED",
});

impl UserStatus {
    /// The other status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Disabled,
            Self::Disabled => Self::Active,
        }
    }
}

// =============================================================================
// Tracking
// =============================================================================

/// Which goods statistic an analytics event bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatEffect {
    /// `viewCount += 1`.
    View,
    /// `salesCount += 1`.
    Sale,
    /// Recorded only.
    None,
}

impl StatEffect {
    /// Map an event name (`impression`, `click`, `purchase`, ...) to its effect.
    #[must_use]
    pub fn for_event(event: &str) -> Self {
        match event {
            "impression" | "click" => Self::View,
            "purchase" => Self::Sale,
            _ => Self::None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_happy_path() {
        let status = OrderStatus::default();
        let status = status.pay().unwrap();
        assert_eq!(status, OrderStatus::PendingShipment);
        let status = status.ship().unwrap();
        assert_eq!(status, OrderStatus::PendingReceipt);
        let status = status.confirm().unwrap();
        assert_eq!(status, OrderStatus::Completed);
        assert!(status.is_deletable());
    }

    #[test]
    fn test_order_invalid_transitions() {
        assert_eq!(
            OrderStatus::PendingShipment.pay(),
            Err(TransitionError {
                action: "pay",
                from: OrderStatus::PendingShipment
            })
        );
        assert!(OrderStatus::PendingPayment.confirm().is_err());
        assert!(OrderStatus::PendingPayment.ship().is_err());
        assert!(!OrderStatus::PendingReceipt.is_deletable());
    }

    #[test]
    fn test_cancel_only_from_non_terminal() {
        for status in OrderStatus::ALL {
            assert_eq!(status.cancel().is_ok(), !status.is_terminal(), "{status}");
        }
    }

    #[test]
    fn test_status_names_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{status}\"")
            );
        }
        assert_eq!("USED".parse::<CouponStatus>().unwrap(), CouponStatus::Used);
        assert_eq!(
            "THRESHOLD".parse::<CouponType>().unwrap(),
            CouponType::Threshold
        );
        let err = "paid".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: paid");
    }

    #[test]
    fn test_toggles() {
        assert_eq!(GoodsStatus::Active.toggled(), GoodsStatus::Inactive);
        assert_eq!(UserStatus::Disabled.toggled(), UserStatus::Active);
    }

    #[test]
    fn test_stat_effect() {
        assert_eq!(StatEffect::for_event("click"), StatEffect::View);
        assert_eq!(StatEffect::for_event("impression"), StatEffect::View);
        assert_eq!(StatEffect::for_event("purchase"), StatEffect::Sale);
        assert_eq!(StatEffect::for_event("share"), StatEffect::None);
    }
}
