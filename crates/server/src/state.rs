//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::{
    MemoryStore, OrderRepository, PgOrderRepository, PgProductRepository, PgUserRepository,
    ProductRepository, UserRepository,
};
use crate::services::{AuthService, CatalogService, OrderService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the repositories behind the services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn with_pool(config: ServerConfig, pool: PgPool) -> Self {
        Self::from_parts(
            config,
            Arc::new(PgProductRepository::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgOrderRepository::new(pool)),
        )
    }

    /// Create application state backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::with_memory_store(config, MemoryStore::new())
    }

    /// Create application state over an existing in-memory store.
    ///
    /// Tests keep a clone of `store` to seed and inspect data directly.
    #[must_use]
    pub fn with_memory_store(config: ServerConfig, store: MemoryStore) -> Self {
        Self::from_parts(
            config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }

    fn from_parts(
        config: ServerConfig,
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                products,
                users,
                orders,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the product repository.
    #[must_use]
    pub fn products(&self) -> &dyn ProductRepository {
        self.inner.products.as_ref()
    }

    /// Get the user repository.
    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.inner.users.as_ref()
    }

    /// Get the order repository.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderRepository {
        self.inner.orders.as_ref()
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.users(), &self.inner.config.token.secret)
    }

    /// Catalog service bound to this state.
    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.products())
    }

    /// Order service bound to this state.
    #[must_use]
    pub fn ordering(&self) -> OrderService<'_> {
        OrderService::new(self.products(), self.orders())
    }
}
