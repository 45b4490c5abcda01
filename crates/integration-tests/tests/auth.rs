//! Integration tests for account registration, login and profile.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use mall_integration_tests::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_register_login_profile_flow() {
    let ctx = TestContext::new().await;
    let (id, first_token) = ctx.register("buyer@example.com").await;

    let login = ctx
        .post(
            "/common/login",
            json!({"account": "buyer@example.com", "password": "abc12345"}),
        )
        .await;
    assert_eq!(login["code"], "200");
    assert_eq!(login["data"]["id"], id);
    let token = login["data"]["token"].as_str().unwrap().to_owned();
    assert_ne!(token, first_token, "login rotates the token");

    let profile: serde_json::Value = ctx
        .client
        .post(format!("{}/common/profile", ctx.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["code"], "200");
    assert_eq!(profile["data"]["account"], "buyer@example.com");
    assert!(profile["data"].get("token").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let ctx = TestContext::new().await;
    ctx.register("13800000001").await;

    let dup = ctx
        .post(
            "/common/register",
            json!({"account": "13800000001", "password": "abc12345"}),
        )
        .await;
    assert_eq!(dup["code"], "409");

    let weak = ctx
        .post(
            "/common/register",
            json!({"account": "weak@example.com", "password": "12345678"}),
        )
        .await;
    assert_eq!(weak["code"], "400");
}

#[tokio::test]
async fn test_wrong_password_and_missing_token() {
    let ctx = TestContext::new().await;
    ctx.register("who@example.com").await;

    let login = ctx
        .post(
            "/common/login",
            json!({"account": "who@example.com", "password": "nope12345"}),
        )
        .await;
    assert_eq!(login["code"], "401");

    let profile = ctx.post("/common/profile", json!({})).await;
    assert_eq!(profile["code"], "401");
}

#[tokio::test]
async fn test_disabled_user_cannot_log_in() {
    let ctx = TestContext::new().await;
    let (id, _) = ctx.register("banned@example.com").await;

    let toggled = ctx
        .admin_post("/admin/user/toggleStatus", json!({"id": id}))
        .await;
    assert_eq!(toggled["code"], "200");

    let login = ctx
        .post(
            "/common/login",
            json!({"account": "banned@example.com", "password": "abc12345"}),
        )
        .await;
    assert_eq!(login["code"], "403");
}
