//! End-to-end tests for the mall backend.
//!
//! Each test spawns the full router on an ephemeral port, backed by a fresh
//! `SQLite` file in a temporary directory, and talks to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mall-integration-tests
//! ```

use std::net::SocketAddr;
use std::path::Path;

use reqwest::Client;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tempfile::TempDir;

use mall_server::config::ServerConfig;
use mall_server::db;
use mall_server::services::seeder::{SeedReport, Seeder};
use mall_server::state::AppState;

/// Admin token of the default configuration.
pub const ADMIN_TOKEN: &str = "ADMIN_SECRET_TOKEN_2025";

/// A running server with its own database.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: SqlitePool,
    _dir: TempDir,
}

impl TestContext {
    /// Start a server on an empty database.
    ///
    /// # Panics
    ///
    /// Panics if the database or listener cannot be set up.
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("mall.db").display());
        let config = ServerConfig {
            database_url: SecretString::from(url),
            seed_on_start: false,
            ..ServerConfig::default()
        };

        let pool = db::create_pool(&config.database_url)
            .await
            .expect("Failed to create database pool");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let app = mall_server::app(AppState::new(config, pool.clone()));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            pool,
            _dir: dir,
        }
    }

    /// Import a fixture tree into this server's database.
    ///
    /// # Panics
    ///
    /// Panics if the import fails.
    pub async fn seed(&self, root: &Path) -> SeedReport {
        Seeder::new(&self.pool, root)
            .run()
            .await
            .expect("Failed to seed fixtures")
    }

    /// POST a JSON body and return the decoded envelope.
    ///
    /// # Panics
    ///
    /// Panics on transport errors or a non-JSON response.
    pub async fn post(&self, path: &str, body: Value) -> Value {
        self.client
            .post(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Request failed")
            .json()
            .await
            .expect("Response is not JSON")
    }

    /// POST to an admin endpoint with the admin token merged into the body.
    ///
    /// # Panics
    ///
    /// Panics on transport errors or if `body` is not an object.
    pub async fn admin_post(&self, path: &str, mut body: Value) -> Value {
        body.as_object_mut()
            .expect("Admin body must be an object")
            .insert("token".to_owned(), json!(ADMIN_TOKEN));
        self.post(path, body).await
    }

    /// Create an active goods row through the admin API and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the admin call fails.
    pub async fn create_goods(&self, description: &str, price: &str) -> i64 {
        let resp = self
            .admin_post(
                "/admin/goods/create",
                json!({"description": description, "price": price, "categoryCode": "001"}),
            )
            .await;
        assert_eq!(resp["code"], "200", "{resp}");
        resp["data"]["id"].as_i64().expect("Goods id missing")
    }

    /// Register an account and return `(user id, token)`.
    ///
    /// # Panics
    ///
    /// Panics if registration fails.
    pub async fn register(&self, account: &str) -> (i64, String) {
        let resp = self
            .post(
                "/common/register",
                json!({"account": account, "password": "abc12345"}),
            )
            .await;
        assert_eq!(resp["code"], "200", "{resp}");
        (
            resp["data"]["id"].as_i64().expect("User id missing"),
            resp["data"]["token"]
                .as_str()
                .expect("Token missing")
                .to_owned(),
        )
    }
}

/// Read an envelope amount (serialized as a decimal string) as `f64`.
///
/// # Panics
///
/// Panics if the value is not a numeric string or number.
#[must_use]
pub fn amount(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().expect("Amount is not numeric"),
        other => other.as_f64().expect("Amount is not numeric"),
    }
}
