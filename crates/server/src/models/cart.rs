//! Carts, cart items and the stores they are grouped by.

use chrono::{DateTime, Utc};

use mall_core::{CartId, CartItemId, StoreId};

/// A store that cart items are grouped under.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Store {
    #[sqlx(try_from = "i64")]
    pub id: StoreId,
    pub store_name: String,
    pub store_code: String,
    pub h5url: Option<String>,
}

/// One cart per user id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Cart {
    #[sqlx(try_from = "i64")]
    pub id: CartId,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A line in a cart. `code` holds the goods id as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItem {
    #[sqlx(try_from = "i64")]
    pub id: CartItemId,
    #[sqlx(try_from = "i64")]
    pub cart_id: CartId,
    #[sqlx(try_from = "i64")]
    pub store_id: StoreId,
    pub code: String,
    pub img_url: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub color: String,
    pub size: String,
    pub num: i64,
    pub selected: bool,
    pub saved: bool,
    pub favorite: bool,
    pub compare: bool,
}

/// Largest quantity a single cart line can hold.
pub const MAX_QUANTITY: i64 = 9_999;

/// Bring a line quantity into `1..=MAX_QUANTITY`.
#[must_use]
pub const fn clamp_quantity(num: i64) -> i64 {
    if num < 1 {
        1
    } else if num > MAX_QUANTITY {
        MAX_QUANTITY
    } else {
        num
    }
}

/// The four boolean toggles of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemFlags {
    pub selected: bool,
    pub saved: bool,
    pub favorite: bool,
    pub compare: bool,
}

impl Default for ItemFlags {
    fn default() -> Self {
        Self {
            selected: true,
            saved: false,
            favorite: false,
            compare: false,
        }
    }
}

impl CartItem {
    /// Current toggles of this line.
    #[must_use]
    pub const fn flags(&self) -> ItemFlags {
        ItemFlags {
            selected: self.selected,
            saved: self.saved,
            favorite: self.favorite,
            compare: self.compare,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(i64::MIN), 1);
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(3), 3);
        assert_eq!(clamp_quantity(i64::MAX), MAX_QUANTITY);
    }
}
