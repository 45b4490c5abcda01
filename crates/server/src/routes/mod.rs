//! HTTP route handlers for the mall app and admin console.
//!
//! Every endpoint is a `POST` taking a JSON body (an empty body counts as
//! `{}`) and answering with the `{code, msg, data}` envelope.
//!
//! # Route Structure
//!
//! ```text
//! # Content
//! POST /home/queryHomePageInfo            - Banners, nine-grid menu, tabs
//! POST /mine/queryMineInfo                - Mine page functions and tabs
//! POST /category/list                     - Level-1 categories
//! POST /category/queryContentByCategory   - Level-2/3 tree under a category
//!
//! # Goods
//! POST /common/queryGoodsListByPage       - Paged listing with sort strategies
//! POST /common/searchGoods                - Keyword search
//! POST /common/trackEvent                 - Impression/click/purchase events
//! POST /detail/queryGoodsDetail           - One goods with display placeholders
//! POST /detail/queryStoreGoodsList        - Goods from the same category
//!
//! # Cart
//! POST /cart/queryCartGoodsList           - Cart grouped by store
//! POST /cart/add | updateItem | removeItem | removeItems
//! POST /cart/selectStore | selectAll | clear
//! POST /cart/admin/clearAll               - Wipe every cart (admin token)
//! POST /cart/queryMaybeLikeList           - Recommended goods
//!
//! # Coupons, orders, addresses
//! POST /coupon/list | receive | available | use
//! POST /order/create | list | detail | pay | confirm | cancel | delete
//! POST /address/list | add | update | delete | setDefault
//!
//! # Accounts and news
//! POST /common/register | login | profile
//! POST /news/list | detail
//!
//! # Admin (body `token` required except for login)
//! POST /admin/login | dashboard | analytics/sales
//! POST /admin/user/list | user/toggleStatus
//! POST /admin/goods/list | create | update | toggleStatus
//! POST /admin/news/list | create | update | delete
//! POST /admin/order/list | order/ship
//!
//! # Anything else
//! *    /*                                 - Recorded mock response or 404
//! ```

pub mod address;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod content;
pub mod coupon;
pub mod goods;
pub mod mock;
pub mod news;
pub mod order;

use axum::{Router, routing::post};

use crate::state::AppState;

/// Create the home, mine and category routes router.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/home/queryHomePageInfo", post(content::home))
        .route("/mine/queryMineInfo", post(content::mine))
        .route("/category/list", post(content::categories))
        .route(
            "/category/queryContentByCategory",
            post(content::category_content),
        )
}

/// Create the goods listing, detail and tracking routes router.
pub fn goods_routes() -> Router<AppState> {
    Router::new()
        .route("/common/queryGoodsListByPage", post(goods::list))
        .route("/common/searchGoods", post(goods::search))
        .route("/common/trackEvent", post(goods::track))
        .route("/detail/queryGoodsDetail", post(goods::detail))
        .route("/detail/queryStoreGoodsList", post(goods::store_goods))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/queryCartGoodsList", post(cart::list))
        .route("/add", post(cart::add))
        .route("/updateItem", post(cart::update_item))
        .route("/removeItem", post(cart::remove_item))
        .route("/removeItems", post(cart::remove_items))
        .route("/selectStore", post(cart::select_store))
        .route("/selectAll", post(cart::select_all))
        .route("/clear", post(cart::clear))
        .route("/admin/clearAll", post(cart::clear_all))
        .route("/queryMaybeLikeList", post(cart::maybe_like))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/list", post(coupon::list))
        .route("/receive", post(coupon::receive))
        .route("/available", post(coupon::available))
        .route("/use", post(coupon::redeem))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(order::create))
        .route("/list", post(order::list))
        .route("/detail", post(order::detail))
        .route("/pay", post(order::pay))
        .route("/confirm", post(order::confirm))
        .route("/cancel", post(order::cancel))
        .route("/delete", post(order::delete))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/list", post(address::list))
        .route("/add", post(address::add))
        .route("/update", post(address::update))
        .route("/delete", post(address::delete))
        .route("/setDefault", post(address::set_default))
}

/// Create the account routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/common/register", post(auth::register))
        .route("/common/login", post(auth::login))
        .route("/common/profile", post(auth::profile))
}

/// Create the news routes router.
pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/list", post(news::list))
        .route("/detail", post(news::detail))
}

/// Create the admin console routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin::login))
        .route("/dashboard", post(admin::dashboard))
        .route("/analytics/sales", post(admin::sales_analytics))
        .route("/user/list", post(admin::list_users))
        .route("/user/toggleStatus", post(admin::toggle_user_status))
        .route("/goods/list", post(admin::list_goods))
        .route("/goods/create", post(admin::create_goods))
        .route("/goods/update", post(admin::update_goods))
        .route("/goods/toggleStatus", post(admin::toggle_goods_status))
        .route("/news/list", post(admin::list_news))
        .route("/news/create", post(admin::create_news))
        .route("/news/update", post(admin::update_news))
        .route("/news/delete", post(admin::delete_news))
        .route("/order/list", post(admin::list_orders))
        .route("/order/ship", post(admin::ship_order))
}

/// Create all routes for the mall server.
///
/// Unmatched requests fall through to the recorded mock responses.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(content_routes())
        .merge(goods_routes())
        .merge(auth_routes())
        .nest("/cart", cart_routes())
        .nest("/coupon", coupon_routes())
        .nest("/order", order_routes())
        .nest("/address", address_routes())
        .nest("/news", news_routes())
        .nest("/admin", admin_routes())
        .fallback(mock::replay)
}
