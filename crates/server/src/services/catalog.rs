//! Catalog browsing and administration.
//!
//! Turns raw query-string parameters into a [`CatalogQuery`], runs it against
//! the product repository, and wraps the admin CRUD operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use tidewear_core::{Price, ProductId};

use crate::db::products::{CatalogFilter, SortOrder};
use crate::db::{ProductRepository, RepositoryError};
use crate::models::{NewProduct, Product, ProductChanges};

/// Page size when the client does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u64 = 100_000;

/// Number of products on the home page.
pub const HOME_PRODUCT_COUNT: u64 = 8;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A query parameter could not be understood.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// No product has this ID.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Raw `GET /products` query parameters.
///
/// Everything is kept as text so malformed numbers produce our own
/// validation message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogParams {
    pub category: Option<String>,
    /// `"min-max"`; either side may be missing.
    pub price_range: Option<String>,
    /// `low-to-high` or `high-to-low`.
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A parsed catalog search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub filter: CatalogFilter,
    pub sort: SortOrder,
    /// 1-based page number.
    pub page: u64,
    /// Page size, at least 1.
    pub limit: u64,
}

impl CatalogQuery {
    /// Parse raw query parameters.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidQuery` if `page` or `limit` is not a
    /// positive integer.
    pub fn parse(params: &CatalogParams) -> Result<Self, CatalogError> {
        let (min_price, max_price) = parse_price_range(params.price_range.as_deref());

        Ok(Self {
            filter: CatalogFilter {
                category: parse_category(params.category.as_deref()),
                min_price,
                max_price,
            },
            sort: parse_sort(params.sort.as_deref()),
            page: parse_positive(params.page.as_deref(), "page", 1)?,
            limit: parse_positive(params.limit.as_deref(), "limit", DEFAULT_PAGE_LIMIT)?,
        })
    }

    /// Number of matching products to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_products: u64,
}

/// Empty, missing or `all` (any case) means no category filter.
fn parse_category(raw: Option<&str>) -> Option<String> {
    let category = raw?.trim();
    if category.is_empty() || category.eq_ignore_ascii_case("all") {
        return None;
    }
    Some(category.to_owned())
}

/// Sides that are missing or not numbers are ignored.
fn parse_price_range(raw: Option<&str>) -> (Option<Price>, Option<Price>) {
    let Some(raw) = raw else {
        return (None, None);
    };
    let (min, max) = raw.split_once('-').unwrap_or((raw, ""));
    (min.trim().parse().ok(), max.trim().parse().ok())
}

fn parse_sort(raw: Option<&str>) -> SortOrder {
    match raw.map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("low-to-high") => SortOrder::PriceAscending,
        Some(s) if s.eq_ignore_ascii_case("high-to-low") => SortOrder::PriceDescending,
        _ => SortOrder::StoreDefault,
    }
}

fn parse_positive(raw: Option<&str>, name: &str, default: u64) -> Result<u64, CatalogError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(CatalogError::InvalidQuery(format!(
            "{name} must be a positive integer"
        ))),
    }
}

/// Catalog service over a product repository.
pub struct CatalogService<'a> {
    products: &'a dyn ProductRepository,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(products: &'a dyn ProductRepository) -> Self {
        Self { products }
    }

    /// Run a catalog search.
    ///
    /// A page past the last one is empty, not an error.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn browse(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
        let total_products = self.products.count(&query.filter).await?;
        let products = self
            .products
            .search(&query.filter, query.sort, query.offset(), query.limit)
            .await?;

        Ok(CatalogPage {
            products,
            current_page: query.page,
            total_pages: total_products.div_ceil(query.limit),
            total_products,
        })
    }

    /// Products for the home page: the first few in store order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn home(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list(Some(HOME_PRODUCT_COUNT)).await?)
    }

    /// Distinct categories, sorted.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn categories(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.products.categories().await?)
    }

    /// Every product, for the admin listing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn all(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list(None).await?)
    }

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    #[instrument(skip_all, fields(name = %product.name))]
    pub async fn create(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let product = self.products.create(product).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the product does not exist.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, CatalogError> {
        let product = self
            .products
            .update(id, changes)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;
        tracing::info!("product updated");
        Ok(product)
    }

    /// Remove a product from the catalog. Past orders keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        if !self.products.delete(id).await? {
            return Err(CatalogError::ProductNotFound(id));
        }
        tracing::info!("product deleted");
        Ok(())
    }
}
