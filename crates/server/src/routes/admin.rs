//! Admin console.
//!
//! `login` checks the configured username and password and hands back the
//! shared admin token. Every other handler takes an [`AdminPayload`], which
//! rejects bodies without that token.

use axum::extract::State;
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use mall_core::{ArticleId, GoodsId, GoodsStatus, OrderId, OrderStatus, UserId, UserStatus};

use crate::db::articles::NewArticle;
use crate::db::goods::{GoodsFilter, GoodsSort, GoodsStats, KeywordScope, NewGoods};
use crate::db::{
    ArticleRepository, GoodsRepository, OrderRepository, Page, PageRequest, UserRepository,
};
use crate::envelope::{ApiJson, ok};
use crate::error::{AppError, Result, missing};
use crate::extract::{AdminPayload, Payload, lenient};
use crate::models::article::ArticleView;
use crate::models::order::OrderView;
use crate::models::{Article, Goods, User, date_only};
use crate::routes::news::{self, category_filter};
use crate::routes::order::{apply_transition, status_filter, with_items};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const DEFAULT_ARTICLE_CATEGORY: &str = "INDUSTRY";

/// Paged admin listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPage<T> {
    pub list: Vec<T>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub has_more: bool,
}

impl<T> From<Page<T>> for AdminPage<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            total_elements: page.total,
            total_pages: page.total_pages(),
            current_page: page.request.page,
            has_more: page.has_more(),
            list: page.items,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    #[serde(deserialize_with = "lenient::string")]
    pub keyword: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub page: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub size: Option<i64>,
    #[serde(rename = "sortField", deserialize_with = "lenient::string")]
    pub sort_field: Option<String>,
    #[serde(rename = "sortDir", deserialize_with = "lenient::string")]
    pub sort_dir: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub category: Option<String>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }

    fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }

    /// Parse `status` as `T`; blank means no filter.
    fn status<T>(&self) -> Result<Option<T>>
    where
        T: std::str::FromStr<Err = mall_core::ParseStatusError>,
    {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<T>)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdRequest {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: Option<i64>,
}

impl IdRequest {
    fn id(&self) -> Result<i64> {
        self.id.ok_or_else(|| missing("id"))
    }
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub username: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminSession {
    pub token: String,
    pub username: String,
}

#[instrument(skip(state, body), fields(username = ?body.username))]
pub async fn login(
    State(state): State<AppState>,
    Payload(body): Payload<LoginRequest>,
) -> Result<ApiJson<AdminSession>> {
    let admin = &state.config().admin;
    let username_ok = body.username.as_deref() == Some(admin.username.as_str());
    let password_ok = body.password.as_deref() == Some(admin.password.expose_secret());
    if !(username_ok && password_ok) {
        tracing::warn!("Admin login rejected");
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_owned(),
        ));
    }

    Ok(ok(AdminSession {
        token: admin.token.expose_secret().to_owned(),
        username: admin.username.clone(),
    }))
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CategorySales {
    pub category: Option<String>,
    pub sales: i64,
}

async fn category_sales(state: &AppState) -> Result<Vec<CategorySales>> {
    let rows = GoodsRepository::new(state.pool()).sales_by_category().await?;
    Ok(rows
        .into_iter()
        .map(|(category, sales)| CategorySales { category, sales })
        .collect())
}

/// Order counts keyed by status name. `skip_zero` drops statuses with no orders.
async fn order_status_counts(state: &AppState, skip_zero: bool) -> Result<Map<String, Value>> {
    let counts = OrderRepository::new(state.pool()).count_by_status().await?;
    Ok(counts
        .into_iter()
        .filter(|(_, count)| !skip_zero || *count > 0)
        .map(|(status, count)| (status.as_str().to_owned(), Value::from(count)))
        .collect())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_users: i64,
    pub active_users: i64,
    pub disabled_users: i64,
    pub total_goods: i64,
    pub active_goods: i64,
    pub inactive_goods: i64,
    pub total_orders: i64,
    pub total_articles: i64,
    pub order_stats: Map<String, Value>,
    pub category_sales: Vec<CategorySales>,
}

#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    AdminPayload(_): AdminPayload<IgnoredAny>,
) -> Result<ApiJson<Dashboard>> {
    let users = UserRepository::new(state.pool());
    let goods = GoodsRepository::new(state.pool());

    Ok(ok(Dashboard {
        total_users: users.count(None).await?,
        active_users: users.count(Some(UserStatus::Active)).await?,
        disabled_users: users.count(Some(UserStatus::Disabled)).await?,
        total_goods: goods.count(None).await?,
        active_goods: goods.count(Some(GoodsStatus::Active)).await?,
        inactive_goods: goods.count(Some(GoodsStatus::Inactive)).await?,
        total_orders: OrderRepository::new(state.pool()).count().await?,
        total_articles: ArticleRepository::new(state.pool()).count().await?,
        order_stats: order_status_counts(&state, false).await?,
        category_sales: category_sales(&state).await?,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalytics {
    pub category_sales: Vec<CategorySales>,
    pub total_revenue: String,
    pub order_status_count: Map<String, Value>,
}

#[instrument(skip_all)]
pub async fn sales_analytics(
    State(state): State<AppState>,
    AdminPayload(_): AdminPayload<IgnoredAny>,
) -> Result<ApiJson<SalesAnalytics>> {
    let revenue = OrderRepository::new(state.pool()).total_revenue().await?;

    Ok(ok(SalesAnalytics {
        category_sales: category_sales(&state).await?,
        total_revenue: revenue.to_fixed(),
        order_status_count: order_status_counts(&state, true).await?,
    }))
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nickname: String,
    pub points: i64,
    pub credit: i64,
    pub status: UserStatus,
    pub created_at: String,
}

impl From<User> for AdminUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: date_only(&user.created_at),
            email: user.email,
            phone: user.phone,
            nickname: user.nickname,
            points: user.points,
            credit: user.credit,
            status: user.status,
        }
    }
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminPayload(query): AdminPayload<PageQuery>,
) -> Result<ApiJson<AdminPage<AdminUser>>> {
    let page = UserRepository::new(state.pool())
        .search(query.keyword(), query.status()?, query.request())
        .await?;

    Ok(ok(page.map(AdminUser::from).into()))
}

/// Flip a user between ACTIVE and DISABLED.
#[instrument(skip_all, fields(id = ?body.id))]
pub async fn toggle_user_status(
    State(state): State<AppState>,
    AdminPayload(body): AdminPayload<IdRequest>,
) -> Result<ApiJson<String>> {
    let repo = UserRepository::new(state.pool());
    let user = repo
        .get_by_id(UserId::new(body.id()?))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    let status = user.status.toggled();
    repo.set_status(user.id, status).await?;
    tracing::info!(user_id = %user.id, %status, "User status changed");

    Ok(ok(format!("Status updated to {status}")))
}

// =============================================================================
// Goods
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminGoods {
    pub id: GoodsId,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub price: Option<String>,
    pub category_code: Option<String>,
    pub img_url: Option<String>,
    pub sales_count: Option<i64>,
    pub rating: Option<f64>,
    pub recommend: Option<bool>,
    pub status: GoodsStatus,
    pub store_name: Option<String>,
    pub created_at: String,
}

impl From<Goods> for AdminGoods {
    fn from(goods: Goods) -> Self {
        Self {
            id: goods.id,
            created_at: goods.created_at.as_ref().map(date_only).unwrap_or_default(),
            description: goods.description,
            tag: goods.tag,
            price: goods.price,
            category_code: goods.category_code,
            img_url: goods.img_url,
            sales_count: goods.sales_count,
            rating: goods.rating,
            recommend: goods.recommend,
            status: goods.status,
            store_name: goods.store_name,
        }
    }
}

#[instrument(skip_all)]
pub async fn list_goods(
    State(state): State<AppState>,
    AdminPayload(query): AdminPayload<PageQuery>,
) -> Result<ApiJson<AdminPage<AdminGoods>>> {
    let filter = GoodsFilter {
        status: query.status()?,
        keyword: query.keyword().map(str::to_owned),
        keyword_scope: KeywordScope::Admin,
        ..GoodsFilter::default()
    };
    let sort = GoodsSort::admin(
        query.sort_field.as_deref().unwrap_or("id"),
        query.sort_dir.as_deref().unwrap_or("desc"),
    );
    let page = GoodsRepository::new(state.pool())
        .list(&filter, sort, query.request())
        .await?;

    Ok(ok(page.map(AdminGoods::from).into()))
}

/// Editable goods fields. Absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoodsEdit {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub tag: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub price: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub category_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub img_url: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub des1: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub des2: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub store_name: Option<String>,
    #[serde(deserialize_with = "lenient::bool")]
    pub recommend: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    pub status: Option<String>,
}

impl GoodsEdit {
    fn status(&self) -> Result<Option<GoodsStatus>> {
        self.status
            .as_deref()
            .map(str::parse::<GoodsStatus>)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))
    }

    fn apply(self, goods: &mut Goods) -> Result<()> {
        if let Some(status) = self.status()? {
            goods.status = status;
        }
        let fields = [
            (self.description, &mut goods.description),
            (self.tag, &mut goods.tag),
            (self.price, &mut goods.price),
            (self.category_code, &mut goods.category_code),
            (self.img_url, &mut goods.img_url),
            (self.des1, &mut goods.des1),
            (self.des2, &mut goods.des2),
            (self.store_name, &mut goods.store_name),
        ];
        for (value, slot) in fields {
            if value.is_some() {
                *slot = value;
            }
        }
        if self.recommend.is_some() {
            goods.recommend = self.recommend;
        }
        Ok(())
    }
}

async fn load_goods(repo: &GoodsRepository<'_>, id: i64) -> Result<Goods> {
    repo.get_by_id(GoodsId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Goods not found".to_owned()))
}

/// Create goods. New goods start ACTIVE unless `status` says otherwise.
#[instrument(skip_all)]
pub async fn create_goods(
    State(state): State<AppState>,
    AdminPayload(edit): AdminPayload<GoodsEdit>,
) -> Result<ApiJson<AdminGoods>> {
    let status = edit.status()?.unwrap_or_default();
    let recommend = edit.recommend.unwrap_or(false);
    let new = NewGoods {
        category_code: edit.category_code,
        img_url: edit.img_url,
        description: edit.description,
        tag: edit.tag,
        des1: edit.des1,
        des2: edit.des2,
        price: edit.price,
        recommend: Some(recommend),
        status,
        store_name: edit.store_name,
        stats: Some(GoodsStats {
            sales_count: 0,
            rating: 0.0,
            view_count: 0,
            created_at: Utc::now(),
            recommend,
        }),
        ..NewGoods::default()
    };

    let repo = GoodsRepository::new(state.pool());
    let id = repo.create(&new).await?;
    tracing::info!(goods_id = %id, "Goods created");

    Ok(ok(load_goods(&repo, id.as_i64()).await?.into()))
}

#[instrument(skip_all, fields(id = ?edit.id))]
pub async fn update_goods(
    State(state): State<AppState>,
    AdminPayload(edit): AdminPayload<GoodsEdit>,
) -> Result<ApiJson<AdminGoods>> {
    let id = edit.id.ok_or_else(|| missing("id"))?;
    let repo = GoodsRepository::new(state.pool());
    let mut goods = load_goods(&repo, id).await?;

    edit.apply(&mut goods)?;
    repo.save(&goods).await?;

    Ok(ok(goods.into()))
}

/// Flip goods between ACTIVE and INACTIVE.
#[instrument(skip_all, fields(id = ?body.id))]
pub async fn toggle_goods_status(
    State(state): State<AppState>,
    AdminPayload(body): AdminPayload<IdRequest>,
) -> Result<ApiJson<String>> {
    let repo = GoodsRepository::new(state.pool());
    let mut goods = load_goods(&repo, body.id()?).await?;

    goods.status = goods.status.toggled();
    repo.save(&goods).await?;
    tracing::info!(goods_id = %goods.id, status = %goods.status, "Goods status changed");

    Ok(ok(format!("Status updated to {}", goods.status)))
}

// =============================================================================
// News
// =============================================================================

#[instrument(skip_all)]
pub async fn list_news(
    State(state): State<AppState>,
    AdminPayload(query): AdminPayload<PageQuery>,
) -> Result<ApiJson<AdminPage<ArticleView>>> {
    let repo = ArticleRepository::new(state.pool());
    news::ensure_demo_articles(&repo).await?;
    let page = repo
        .list(category_filter(query.category.as_deref()), query.request())
        .await?;

    Ok(ok(page.map(ArticleView::detail).into()))
}

/// Editable article fields. Absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArticleEdit {
    #[serde(deserialize_with = "lenient::i64")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub content: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub source: Option<String>,
}

impl ArticleEdit {
    fn apply(self, article: &mut Article) {
        if let Some(title) = self.title {
            article.title = title;
        }
        let fields = [
            (self.summary, &mut article.summary),
            (self.content, &mut article.content),
            (self.image_url, &mut article.image_url),
            (self.category, &mut article.category),
            (self.source, &mut article.source),
        ];
        for (value, slot) in fields {
            if value.is_some() {
                *slot = value;
            }
        }
    }
}

#[instrument(skip_all)]
pub async fn create_news(
    State(state): State<AppState>,
    AdminPayload(edit): AdminPayload<ArticleEdit>,
) -> Result<ApiJson<ArticleView>> {
    let article = ArticleRepository::new(state.pool())
        .create(&NewArticle {
            title: edit.title.unwrap_or_default(),
            summary: edit.summary,
            content: edit.content,
            image_url: edit.image_url,
            category: Some(
                edit.category
                    .unwrap_or_else(|| DEFAULT_ARTICLE_CATEGORY.to_owned()),
            ),
            source: edit.source,
            view_count: 0,
            published_at: None,
        })
        .await?;
    tracing::info!(article_id = %article.id, "Article created");

    Ok(ok(ArticleView::detail(article)))
}

#[instrument(skip_all, fields(id = ?edit.id))]
pub async fn update_news(
    State(state): State<AppState>,
    AdminPayload(edit): AdminPayload<ArticleEdit>,
) -> Result<ApiJson<ArticleView>> {
    let id = ArticleId::new(edit.id.ok_or_else(|| missing("id"))?);
    let repo = ArticleRepository::new(state.pool());
    let mut article = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_owned()))?;

    edit.apply(&mut article);
    repo.update(&article).await?;

    Ok(ok(ArticleView::detail(article)))
}

#[instrument(skip_all, fields(id = ?body.id))]
pub async fn delete_news(
    State(state): State<AppState>,
    AdminPayload(body): AdminPayload<IdRequest>,
) -> Result<ApiJson<&'static str>> {
    ArticleRepository::new(state.pool())
        .delete(ArticleId::new(body.id()?))
        .await?;

    Ok(ok("Article deleted"))
}

// =============================================================================
// Orders
// =============================================================================

/// Every user's orders, newest first.
#[instrument(skip_all)]
pub async fn list_orders(
    State(state): State<AppState>,
    AdminPayload(query): AdminPayload<PageQuery>,
) -> Result<ApiJson<AdminPage<OrderView>>> {
    let status = status_filter(query.status.as_deref())?;
    let repo = OrderRepository::new(state.pool());
    let mut page = repo.list(None, status, query.request()).await?;
    let views = with_items(&repo, std::mem::take(&mut page.items)).await?;

    Ok(ok(AdminPage {
        total_elements: page.total,
        total_pages: page.total_pages(),
        current_page: page.request.page,
        has_more: page.has_more(),
        list: views,
    }))
}

/// Mark a paid order as shipped.
#[instrument(skip_all, fields(id = ?body.id))]
pub async fn ship_order(
    State(state): State<AppState>,
    AdminPayload(body): AdminPayload<IdRequest>,
) -> Result<ApiJson<OrderStatus>> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_by_id(OrderId::new(body.id()?))
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    let status = apply_transition(&repo, &order, OrderStatus::ship).await?;
    Ok(ok(status))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn goods() -> Goods {
        Goods {
            id: GoodsId::new(3),
            category_code: Some("c1".to_owned()),
            img_url: None,
            description: Some("old".to_owned()),
            tag: Some("t".to_owned()),
            des1: None,
            des2: None,
            kind: None,
            price: Some("10.00".to_owned()),
            h5url: None,
            recommend: Some(true),
            status: GoodsStatus::Active,
            sales_count: Some(5),
            rating: Some(4.5),
            view_count: Some(50),
            created_at: None,
            store_name: None,
            store_rating: None,
            store_level: None,
            shipping: None,
        }
    }

    #[test]
    fn test_goods_edit_patches_present_fields() {
        let mut g = goods();
        let edit: GoodsEdit = serde_json::from_str(
            r#"{"description": "new", "price": 12.5, "recommend": "false", "status": "INACTIVE"}"#,
        )
        .unwrap();
        edit.apply(&mut g).unwrap();

        assert_eq!(g.description.as_deref(), Some("new"));
        assert_eq!(g.price.as_deref(), Some("12.5"));
        assert_eq!(g.recommend, Some(false));
        assert_eq!(g.status, GoodsStatus::Inactive);
        assert_eq!(g.tag.as_deref(), Some("t"));
        assert_eq!(g.category_code.as_deref(), Some("c1"));
    }

    #[test]
    fn test_goods_edit_rejects_unknown_status() {
        let mut g = goods();
        let edit: GoodsEdit = serde_json::from_str(r#"{"status": "GONE"}"#).unwrap();
        assert_eq!(edit.apply(&mut g).unwrap_err().code(), "400");
    }

    #[test]
    fn test_page_query_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.request(), PageRequest::new(0, DEFAULT_PAGE_SIZE));
        assert!(query.keyword().is_none());
        assert_eq!(query.status::<UserStatus>().unwrap(), None);

        let query: PageQuery = serde_json::from_str(r#"{"status": "DISABLED", "keyword": ""}"#).unwrap();
        assert_eq!(query.status::<UserStatus>().unwrap(), Some(UserStatus::Disabled));
        assert!(query.keyword().is_none());
    }
}
