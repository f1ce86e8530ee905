//! HTTP route handlers for the JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Storage readiness check
//!
//! # Accounts
//! POST /register               - Create an account, returns a token
//! POST /login                  - Sign in, returns a token
//!
//! # Catalog
//! GET  /products               - Filtered, sorted, paginated listing
//! GET  /products/home          - First products in store order
//! GET  /products/categories    - Distinct categories
//!
//! # Orders (bearer token)
//! POST /orders                 - Place an order
//! GET  /orders/my-orders       - Order history with product details
//!
//! # Admin (bearer token, admin user)
//! POST   /admin                - Admin check
//! GET    /admin/products       - All products
//! POST   /admin/products       - Create a product
//! PUT    /admin/products/{id}  - Partially update a product
//! DELETE /admin/products/{id}  - Delete a product
//!
//! # Pages
//! GET  /, /shop, /blog, /contacts - Placeholder messages
//! ```

pub mod admin;
pub mod auth;
pub mod health;
pub mod orders;
pub mod pages;
pub mod products;

use axum::{
    Router,
    extract::Request,
    middleware::from_fn,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::{cors_layer, request_id_middleware};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/home", get(products::home))
        .route("/categories", get(products::categories))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/my-orders", get(orders::my_orders))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(admin::welcome))
        .route(
            "/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Accounts
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Catalog, checkout, admin
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
        // Placeholder pages
        .route("/", get(pages::home))
        .route("/shop", get(pages::shop))
        .route("/blog", get(pages::blog))
        .route("/contacts", get(pages::contacts))
}

/// Build the complete application with its middleware stack.
pub fn app(state: AppState) -> Router {
    // Cors needs a `Default` response body, so it sits inside the trace layer
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config().allowed_origins));

    routes()
        .layer(middleware)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
