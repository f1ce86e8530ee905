//! Storage for the catalog, accounts and orders.
//!
//! # Backends
//!
//! Each store is a trait object (`Arc<dyn ProductRepository>` and friends) so
//! handlers and services never know which backend is live:
//!
//! - [`postgres`] - `PostgreSQL` via `sqlx`, used in production
//! - [`memory`] - a process-local store behind a `tokio` lock, used by tests
//!   and by `TIDEWEAR_STORAGE=memory`
//!
//! # Database schema
//!
//! - `catalog.product` - products and their stock
//! - `identity.user` - accounts and password hashes
//! - `sales.order` / `sales.order_item` - placed orders and their line items
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tidewear-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod postgres;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tidewear_core::ProductId;

pub use memory::MemoryStore;
pub use orders::OrderRepository;
pub use postgres::{PgOrderRepository, PgProductRepository, PgUserRepository};
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A conditional stock decrement found less stock than requested.
    #[error("not enough stock for product {0}")]
    InsufficientStock(ProductId),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}
