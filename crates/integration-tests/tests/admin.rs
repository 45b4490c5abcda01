//! Integration tests for the admin console API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use mall_integration_tests::{ADMIN_TOKEN, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_login_returns_shared_token() {
    let ctx = TestContext::new().await;

    let ok = ctx
        .post(
            "/admin/login",
            json!({"username": "admin", "password": "admin123"}),
        )
        .await;
    assert_eq!(ok["code"], "200");
    assert_eq!(ok["data"]["token"], ADMIN_TOKEN);

    let bad = ctx
        .post("/admin/login", json!({"username": "admin", "password": "guess"}))
        .await;
    assert_eq!(bad["code"], "401");
}

#[tokio::test]
async fn test_every_admin_endpoint_checks_token() {
    let ctx = TestContext::new().await;
    for path in [
        "/admin/dashboard",
        "/admin/analytics/sales",
        "/admin/user/list",
        "/admin/goods/list",
        "/admin/news/list",
        "/admin/order/list",
    ] {
        let resp = ctx.post(path, json!({"token": "wrong"})).await;
        assert_eq!(resp["code"], "401", "{path}");
        let resp = ctx.post(path, json!({})).await;
        assert_eq!(resp["code"], "401", "{path}");
    }
}

#[tokio::test]
async fn test_goods_management() {
    let ctx = TestContext::new().await;
    let id = ctx.create_goods("Desk lamp", "59.00").await;

    let updated = ctx
        .admin_post(
            "/admin/goods/update",
            json!({"id": id, "price": "49.00", "tag": "sale"}),
        )
        .await;
    assert_eq!(updated["data"]["price"], "49.00");
    assert_eq!(updated["data"]["description"], "Desk lamp");
    assert_eq!(updated["data"]["salesCount"], 0);

    let listed = ctx
        .admin_post("/admin/goods/list", json!({"keyword": "lamp"}))
        .await;
    assert_eq!(listed["data"]["totalElements"], 1);

    // Deactivated goods disappear from the storefront
    let toggled = ctx
        .admin_post("/admin/goods/toggleStatus", json!({"id": id}))
        .await;
    assert_eq!(toggled["code"], "200");
    let storefront = ctx
        .post("/common/searchGoods", json!({"keyword": "lamp"}))
        .await;
    assert_eq!(storefront["data"]["totalCount"], 0);

    let inactive = ctx
        .admin_post("/admin/goods/list", json!({"status": "INACTIVE"}))
        .await;
    assert_eq!(inactive["data"]["totalElements"], 1);

    let missing = ctx
        .admin_post("/admin/goods/update", json!({"id": 99_999, "price": "1.00"}))
        .await;
    assert_eq!(missing["code"], "404");
}

#[tokio::test]
async fn test_user_management() {
    let ctx = TestContext::new().await;
    ctx.register("first@example.com").await;
    let (id, _) = ctx.register("second@example.com").await;

    let all = ctx.admin_post("/admin/user/list", json!({})).await;
    assert_eq!(all["data"]["totalElements"], 2);

    let found = ctx
        .admin_post("/admin/user/list", json!({"keyword": "second"}))
        .await;
    assert_eq!(found["data"]["list"][0]["id"], id);

    ctx.admin_post("/admin/user/toggleStatus", json!({"id": id}))
        .await;
    let disabled = ctx
        .admin_post("/admin/user/list", json!({"status": "DISABLED"}))
        .await;
    assert_eq!(disabled["data"]["totalElements"], 1);

    let dashboard = ctx.admin_post("/admin/dashboard", json!({})).await;
    assert_eq!(dashboard["data"]["totalUsers"], 2);
    assert_eq!(dashboard["data"]["disabledUsers"], 1);
}

#[tokio::test]
async fn test_dashboard_and_analytics_reflect_orders() {
    let ctx = TestContext::new().await;
    let goods = ctx.create_goods("Kettle", "25.00").await;
    ctx.post("/cart/add", json!({"userId": "s1", "goodsId": goods, "num": 2}))
        .await;
    let created = ctx.post("/order/create", json!({"userId": "s1"})).await;
    let order_id = created["data"]["orderId"].clone();

    let dashboard = ctx.admin_post("/admin/dashboard", json!({})).await;
    assert_eq!(dashboard["data"]["totalOrders"], 1);
    assert_eq!(dashboard["data"]["orderStats"]["PENDING_PAYMENT"], 1);
    assert_eq!(dashboard["data"]["orderStats"]["COMPLETED"], 0);

    // Revenue sums every placed order
    let analytics = ctx.admin_post("/admin/analytics/sales", json!({})).await;
    assert_eq!(analytics["data"]["totalRevenue"], "50.00");

    ctx.post("/order/pay", json!({"userId": "s1", "orderId": order_id}))
        .await;
    let analytics = ctx.admin_post("/admin/analytics/sales", json!({})).await;
    assert_eq!(analytics["data"]["orderStatusCount"]["PENDING_SHIPMENT"], 1);
    assert!(analytics["data"]["orderStatusCount"].get("CANCELLED").is_none());

    let orders = ctx
        .admin_post("/admin/order/list", json!({"status": "PENDING_SHIPMENT"}))
        .await;
    assert_eq!(orders["data"]["totalElements"], 1);
}

#[tokio::test]
async fn test_news_management() {
    let ctx = TestContext::new().await;

    let created = ctx
        .admin_post(
            "/admin/news/create",
            json!({"title": "Spring sale", "summary": "Up to 50% off", "content": "Details", "category": "TECH"}),
        )
        .await;
    assert_eq!(created["code"], "200");
    let id = created["data"]["id"].clone();

    let updated = ctx
        .admin_post("/admin/news/update", json!({"id": id, "title": "Spring sale extended"}))
        .await;
    assert_eq!(updated["data"]["title"], "Spring sale extended");
    assert_eq!(updated["data"]["summary"], "Up to 50% off");

    let deleted = ctx.admin_post("/admin/news/delete", json!({"id": id})).await;
    assert_eq!(deleted["code"], "200");

    let detail = ctx.post("/news/detail", json!({"id": id})).await;
    assert_eq!(detail["code"], "404");
}
