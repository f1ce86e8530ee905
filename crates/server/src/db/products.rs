//! Product repository interface.

use async_trait::async_trait;

use tidewear_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductChanges};

/// Filters applied to a catalog search. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Exact, case-sensitive category match.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Price>,
    /// Inclusive upper price bound.
    pub max_price: Option<Price>,
}

impl CatalogFilter {
    /// Whether a product passes every filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category
            .as_deref()
            .is_none_or(|category| product.category == category)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }
}

/// Result ordering for catalog searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Insertion order.
    #[default]
    StoreDefault,
    /// Cheapest first.
    PriceAscending,
    /// Most expensive first.
    PriceDescending,
}

/// Access to the product catalog.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product.
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Get a product by ID.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Get every product whose ID is in `ids`. Unknown IDs are skipped.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// List products in store-default order, optionally capped.
    async fn list(&self, limit: Option<u64>) -> Result<Vec<Product>, RepositoryError>;

    /// One page of products matching `filter`.
    async fn search(
        &self,
        filter: &CatalogFilter,
        sort: SortOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Number of products matching `filter`.
    async fn count(&self, filter: &CatalogFilter) -> Result<u64, RepositoryError>;

    /// Distinct categories, sorted.
    async fn categories(&self) -> Result<Vec<String>, RepositoryError>;

    /// Apply a partial update. Returns `None` if the product does not exist.
    async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product. Returns `false` if it did not exist.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Delete every product, returning how many were removed.
    async fn delete_all(&self) -> Result<u64, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
