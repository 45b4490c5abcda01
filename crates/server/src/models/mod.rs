//! Domain models for the mall backend.
//!
//! Each model is both the `sqlx` row type and the JSON shape the app sees
//! (camelCase keys). Stored text columns holding statuses or amounts are
//! decoded into `mall-core` types through `#[sqlx(try_from = "String")]`.

pub mod article;
pub mod cart;
pub mod catalog;
pub mod content;
pub mod coupon;
pub mod order;
pub mod user;

pub use article::Article;
pub use cart::{Cart, CartItem, Store};
pub use catalog::{Category, Goods};
pub use content::{ApiMock, Banner, MenuEntry, Tab};
pub use coupon::Coupon;
pub use order::{Order, OrderItem};
pub use user::{Address, User};

/// Format a timestamp as `yyyy-MM-dd` for list views.
#[must_use]
pub fn date_only(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}
