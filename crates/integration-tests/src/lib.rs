//! Integration tests for Tidewear.
//!
//! Tests drive the complete router (middleware included) through
//! `axum-test` over an in-memory store, so no database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tidewear-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Registration, login and bearer tokens
//! - `catalog` - Filtering, sorting and pagination
//! - `orders` - Checkout and order history
//! - `admin` - Admin product management
//! - `pages` - Placeholder pages and health checks
//! - `cors` - Cross-origin headers for configured origins

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use axum_test::TestServer;
use serde_json::{Value, json};

use tidewear_core::{Email, Price};
use tidewear_server::config::ServerConfig;
use tidewear_server::db::{MemoryStore, ProductRepository, UserRepository};
use tidewear_server::models::{NewProduct, Product};
use tidewear_server::routes;
use tidewear_server::state::AppState;

/// Token secret used by every test server.
pub const TEST_TOKEN_SECRET: &str = "kT9#mQ2$vX7!pL4@wZ8&nR3*hJ6^bF1%";

/// Password used for users created by the helpers.
pub const TEST_PASSWORD: &str = "correct horse battery";

/// A running test application and a handle on its store.
pub struct TestContext {
    pub server: TestServer,
    pub store: MemoryStore,
}

impl TestContext {
    /// Build the application over an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ServerConfig::in_memory(TEST_TOKEN_SECRET))
    }

    /// Build the application with a custom configuration. The storage
    /// setting is ignored; the store is always in memory.
    #[must_use]
    pub fn with_config(config: ServerConfig) -> Self {
        let store = MemoryStore::new();
        let state = AppState::with_memory_store(config, store.clone());
        let server = TestServer::try_new(routes::app(state)).expect("Failed to start test server");

        Self { server, store }
    }

    /// Register a user through the API and return the response body.
    pub async fn register(&self, name: &str, email: &str) -> Value {
        let response = self
            .server
            .post("/register")
            .json(&json!({ "name": name, "email": email, "password": TEST_PASSWORD }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Register a user and return their bearer token.
    pub async fn customer_token(&self, email: &str) -> String {
        token_of(&self.register("Customer", email).await)
    }

    /// Register a user, promote them in the store, and return their token.
    pub async fn admin_token(&self, email: &str) -> String {
        let token = token_of(&self.register("Admin", email).await);

        let email = Email::parse(email).expect("valid email");
        UserRepository::set_admin(&self.store, &email, true)
            .await
            .expect("store error")
            .expect("user exists");

        token
    }

    /// Insert a product directly into the store.
    pub async fn add_product(
        &self,
        name: &str,
        price_cents: i64,
        category: &str,
        quantity: u32,
    ) -> Product {
        ProductRepository::create(
            &self.store,
            NewProduct {
                name: name.to_owned(),
                price: Price::from_cents(price_cents).expect("valid price"),
                image: format!("images/{}.jpg", name.to_lowercase().replace(' ', "-")),
                is_new: false,
                is_on_sale: false,
                is_best_seller: false,
                category: category.to_owned(),
                quantity,
            },
        )
        .await
        .expect("store error")
    }

    /// Current stock of a product, read from the store.
    pub async fn stock_of(&self, product: &Product) -> u32 {
        ProductRepository::get(&self.store, product.id)
            .await
            .expect("store error")
            .expect("product exists")
            .quantity
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the `token` field from a register or login response.
#[must_use]
pub fn token_of(body: &Value) -> String {
    body["token"]
        .as_str()
        .expect("response has a token")
        .to_owned()
}
