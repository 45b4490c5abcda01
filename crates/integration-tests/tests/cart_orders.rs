//! Integration tests for the cart and the order lifecycle.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use mall_integration_tests::{TestContext, amount};
use serde_json::{Value, json};

async fn add(ctx: &TestContext, user: &str, goods_id: i64, num: i64) -> Value {
    ctx.post(
        "/cart/add",
        json!({"userId": user, "goodsId": goods_id, "num": num, "color": "red", "size": "M"}),
    )
    .await
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_adding_same_variant_merges_quantity() {
    let ctx = TestContext::new().await;
    let goods = ctx.create_goods("T-shirt", "49.90").await;

    let first = add(&ctx, "u1", goods, 1).await;
    assert_eq!(first["code"], "200");
    let second = add(&ctx, "u1", goods, 2).await;
    assert_eq!(second["data"]["itemId"], first["data"]["itemId"]);
    assert_eq!(second["data"]["num"], 3);

    let cart = ctx
        .post("/cart/queryCartGoodsList", json!({"userId": "u1"}))
        .await;
    let stores = cart["data"].as_array().unwrap();
    assert_eq!(stores.len(), 1);
    let lines = stores[0]["goodsList"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["num"], 3);
    assert_eq!(lines[0]["select"], true);
    assert_eq!(stores[0]["select"], true);
}

#[tokio::test]
async fn test_add_rejects_non_positive_and_caps_quantity() {
    let ctx = TestContext::new().await;
    let goods = ctx.create_goods("Socks", "10.00").await;
    add(&ctx, "u1", goods, 1).await;

    for num in [0, -5] {
        let rejected = add(&ctx, "u1", goods, num).await;
        assert_eq!(rejected["code"], "400", "{rejected}");
    }

    let capped = add(&ctx, "u1", goods, i64::MAX).await;
    assert_eq!(capped["code"], "200", "{capped}");
    assert_eq!(capped["data"]["num"], 9_999);

    let again = add(&ctx, "u1", goods, i64::MAX).await;
    assert_eq!(again["data"]["num"], 9_999);

    let created = ctx
        .post("/order/create", json!({"userId": "u1"}))
        .await;
    assert_eq!(created["code"], "200", "{created}");
    assert!((amount(&created["data"]["totalAmount"]) - 99_990.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_empty_store_code_uses_default_store() {
    let ctx = TestContext::new().await;
    let goods = ctx.create_goods("Cap", "8.00").await;
    let added = ctx
        .post(
            "/cart/add",
            json!({"userId": "u1", "goodsId": goods, "storeCode": ""}),
        )
        .await;
    assert_eq!(added["code"], "200");

    let cart = ctx
        .post("/cart/queryCartGoodsList", json!({"userId": "u1"}))
        .await;
    assert_eq!(cart["data"][0]["storeCode"], "default");
}

#[tokio::test]
async fn test_cart_items_are_private() {
    let ctx = TestContext::new().await;
    let goods = ctx.create_goods("Mug", "12.00").await;
    let item_id = add(&ctx, "owner", goods, 1).await["data"]["itemId"].clone();

    let stolen = ctx
        .post(
            "/cart/removeItem",
            json!({"userId": "thief", "itemId": item_id}),
        )
        .await;
    assert_eq!(stolen["code"], "403");

    let missing = ctx
        .post("/cart/updateItem", json!({"userId": "owner", "itemId": 9999}))
        .await;
    assert_eq!(missing["code"], "404");
}

#[tokio::test]
async fn test_add_unknown_goods_is_404() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .post("/cart/add", json!({"userId": "u1", "goodsId": 424_242}))
        .await;
    assert_eq!(resp["code"], "404");

    let resp = ctx.post("/cart/add", json!({"userId": "u1"})).await;
    assert_eq!(resp["code"], "400");
}

#[tokio::test]
async fn test_clear_all_requires_admin_token() {
    let ctx = TestContext::new().await;
    let denied = ctx.post("/cart/admin/clearAll", json!({})).await;
    assert_eq!(denied["code"], "401");

    let goods = ctx.create_goods("Pen", "3.50").await;
    add(&ctx, "u1", goods, 1).await;
    let cleared = ctx.admin_post("/cart/admin/clearAll", json!({})).await;
    assert_eq!(cleared["code"], "200");

    let cart = ctx
        .post("/cart/queryCartGoodsList", json!({"userId": "u1"}))
        .await;
    assert_eq!(cart["data"], json!([]));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_order_takes_only_selected_lines() {
    let ctx = TestContext::new().await;
    let kept = ctx.create_goods("Notebook", "5.00").await;
    let ordered = ctx.create_goods("Lamp", "30.00").await;

    let kept_item = ctx
        .post(
            "/cart/add",
            json!({"userId": "u1", "goodsId": kept, "num": 3, "selected": false}),
        )
        .await["data"]["itemId"]
        .clone();
    add(&ctx, "u1", ordered, 1).await;

    let created = ctx
        .post("/order/create", json!({"userId": "u1"}))
        .await;
    assert_eq!(created["code"], "200", "{created}");
    assert!((amount(&created["data"]["totalAmount"]) - 30.0).abs() < f64::EPSILON);
    let order_id = created["data"]["orderId"].as_i64().unwrap();

    let detail = ctx
        .post("/order/detail", json!({"userId": "u1", "orderId": order_id}))
        .await;
    let items = detail["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 1);

    let cart = ctx
        .post("/cart/queryCartGoodsList", json!({"userId": "u1"}))
        .await;
    let lines: Vec<&Value> = cart["data"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|s| s["goodsList"].as_array().unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], kept_item);
    assert_eq!(lines[0]["num"], 3);
    assert_eq!(lines[0]["select"], false);
}

#[tokio::test]
async fn test_order_lifecycle() {
    let ctx = TestContext::new().await;
    let goods = ctx.create_goods("Headphones", "100.00").await;
    add(&ctx, "u1", goods, 2).await;

    let created = ctx
        .post(
            "/order/create",
            json!({"userId": "u1", "receiverName": "李四", "receiverPhone": "13900000000",
                   "receiverAddress": "上海市浦东新区"}),
        )
        .await;
    assert_eq!(created["code"], "200", "{created}");
    assert!((amount(&created["data"]["totalAmount"]) - 200.0).abs() < f64::EPSILON);
    assert!(created["data"]["orderNo"].as_str().unwrap().starts_with("ORD"));
    let order_id = created["data"]["orderId"].as_i64().unwrap();

    // Ordered lines leave the cart
    let cart = ctx
        .post("/cart/queryCartGoodsList", json!({"userId": "u1"}))
        .await;
    assert!(
        cart["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["goodsList"].as_array().unwrap().is_empty())
    );

    let detail = ctx
        .post("/order/detail", json!({"userId": "u1", "orderId": order_id}))
        .await;
    assert_eq!(detail["data"]["status"], "PENDING_PAYMENT");
    assert_eq!(detail["data"]["statusText"], "待付款");
    assert_eq!(detail["data"]["items"][0]["quantity"], 2);

    let confirm_early = ctx
        .post("/order/confirm", json!({"userId": "u1", "orderId": order_id}))
        .await;
    assert_eq!(confirm_early["code"], "400");

    let paid = ctx
        .post("/order/pay", json!({"userId": "u1", "orderId": order_id}))
        .await;
    assert_eq!(paid["code"], "200");

    let shipped = ctx
        .admin_post("/admin/order/ship", json!({"id": order_id}))
        .await;
    assert_eq!(shipped["data"], "PENDING_RECEIPT");

    let confirmed = ctx
        .post("/order/confirm", json!({"userId": "u1", "orderId": order_id}))
        .await;
    assert_eq!(confirmed["code"], "200");

    let cancel = ctx
        .post("/order/cancel", json!({"userId": "u1", "orderId": order_id}))
        .await;
    assert_eq!(cancel["code"], "400", "completed orders cannot be cancelled");

    let completed = ctx
        .post("/order/list", json!({"userId": "u1", "status": "COMPLETED"}))
        .await;
    assert_eq!(completed["data"]["totalElements"], 1);

    let deleted = ctx
        .post("/order/delete", json!({"userId": "u1", "orderId": order_id}))
        .await;
    assert_eq!(deleted["code"], "200");
}

#[tokio::test]
async fn test_order_uses_coupon_and_default_address() {
    let ctx = TestContext::new().await;
    let goods = ctx.create_goods("Backpack", "80.00").await;
    add(&ctx, "u2", goods, 1).await;

    // Listing addresses gives the user a default one
    let addresses = ctx.post("/address/list", json!({"userId": "u2"})).await;
    let default_name = addresses["data"][0]["name"].as_str().unwrap().to_owned();

    let coupons = ctx
        .post("/coupon/available", json!({"userId": "u2", "orderAmount": "80.00"}))
        .await;
    let coupon = coupons["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| (amount(&c["amount"]) - 15.0).abs() < f64::EPSILON)
        .unwrap()
        .clone();

    let created = ctx
        .post(
            "/order/create",
            json!({"userId": "u2", "couponId": coupon["id"]}),
        )
        .await;
    assert_eq!(created["code"], "200", "{created}");
    assert!((amount(&created["data"]["totalAmount"]) - 65.0).abs() < f64::EPSILON);

    let order_id = created["data"]["orderId"].clone();
    let detail = ctx
        .post("/order/detail", json!({"userId": "u2", "orderId": order_id}))
        .await;
    assert_eq!(detail["data"]["receiverName"], default_name.as_str());
    assert!((amount(&detail["data"]["discountAmount"]) - 15.0).abs() < f64::EPSILON);

    let used = ctx
        .post("/coupon/list", json!({"userId": "u2", "status": "USED"}))
        .await;
    assert_eq!(used["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_requires_selected_items() {
    let ctx = TestContext::new().await;
    let empty = ctx.post("/order/create", json!({"userId": "nobody"})).await;
    assert_eq!(empty["code"], "400");

    let goods = ctx.create_goods("Lamp", "30.00").await;
    let item = add(&ctx, "u3", goods, 1).await;
    ctx.post(
        "/cart/updateItem",
        json!({"userId": "u3", "itemId": item["data"]["itemId"], "selected": false}),
    )
    .await;
    let unselected = ctx.post("/order/create", json!({"userId": "u3"})).await;
    assert_eq!(unselected["code"], "400");
}

#[tokio::test]
async fn test_orders_are_private_and_filter_is_validated() {
    let ctx = TestContext::new().await;
    let goods = ctx.create_goods("Book", "20.00").await;
    add(&ctx, "u4", goods, 1).await;
    let created = ctx.post("/order/create", json!({"userId": "u4"})).await;
    let order_id = created["data"]["orderId"].clone();

    let other = ctx
        .post("/order/detail", json!({"userId": "u5", "orderId": order_id}))
        .await;
    assert_eq!(other["code"], "403");

    let bad_filter = ctx
        .post("/order/list", json!({"userId": "u4", "status": "LOST"}))
        .await;
    assert_eq!(bad_filter["code"], "400");

    let delete_open = ctx
        .post("/order/delete", json!({"userId": "u4", "orderId": order_id}))
        .await;
    assert_eq!(delete_open["code"], "400", "open orders cannot be deleted");
}
