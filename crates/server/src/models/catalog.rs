//! Goods and categories.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mall_core::{GoodsId, GoodsStatus};

/// `type` value marking promoted goods.
pub const PROMOTED_TYPE: &str = "2";

/// Code of the category whose children are shown when none is requested.
pub const ROOT_CATEGORY_CODE: &str = "000";

/// A catalog item.
///
/// Statistics are nullable until the seeder backfills them.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Goods {
    #[sqlx(try_from = "i64")]
    pub id: GoodsId,
    pub category_code: Option<String>,
    pub img_url: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub des1: Option<String>,
    pub des2: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
    pub price: Option<String>,
    pub h5url: Option<String>,
    pub recommend: Option<bool>,
    #[sqlx(try_from = "String")]
    pub status: GoodsStatus,
    pub sales_count: Option<i64>,
    pub rating: Option<f64>,
    pub view_count: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub store_name: Option<String>,
    pub store_rating: Option<f64>,
    pub store_level: Option<String>,
    pub shipping: Option<String>,
}

impl Goods {
    /// Fill display fields the detail page always shows.
    #[must_use]
    pub fn with_detail_placeholders(mut self) -> Self {
        self.store_name
            .get_or_insert_with(|| "爱回收严选手机旗舰店".to_owned());
        self.store_rating.get_or_insert(4.8);
        self.store_level.get_or_insert_with(|| "钻石级".to_owned());
        self.shipping.get_or_insert_with(|| "包邮".to_owned());
        self.sales_count.get_or_insert(8600);
        self.rating.get_or_insert(4.8);
        self
    }
}

/// A node of the category tree (level 1..=3), keyed by `code`/`parent_code`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub parent_code: Option<String>,
    pub level: i64,
    pub icon_url: Option<String>,
    pub banner_url: Option<String>,
}
