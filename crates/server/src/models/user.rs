//! App users and their shipping addresses.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mall_core::{AddressId, UserId, UserStatus};

/// A registered app user.
///
/// Not `Serialize`: the password hash and token must never reach a response
/// by accident. Routes build their payloads explicitly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    #[sqlx(try_from = "i64")]
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub auth_token: Option<String>,
    pub nickname: String,
    pub points: i64,
    pub credit: i64,
    #[sqlx(try_from = "String")]
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The identifier the user registered with.
    #[must_use]
    pub fn account(&self) -> &str {
        self.email
            .as_deref()
            .or(self.phone.as_deref())
            .unwrap_or_default()
    }
}

/// A shipping address. At most one per user has `is_default` set.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[sqlx(try_from = "i64")]
    pub id: AddressId,
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub region: String,
    pub detail: String,
    pub is_default: bool,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Region and street joined for an order's receiver address.
    #[must_use]
    pub fn full_address(&self) -> String {
        format!("{}{}", self.region, self.detail)
    }
}
