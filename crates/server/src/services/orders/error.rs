//! Order placement error types.

use thiserror::Error;

use tidewear_core::ProductId;

use crate::db::RepositoryError;

/// Errors that can occur while placing or listing orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The checkout had no line items.
    #[error("No order items")]
    EmptyOrder,

    /// A line item broke a field rule.
    #[error("Invalid order item {index}: {reason}")]
    InvalidLineItem {
        /// Zero-based position of the item in the request.
        index: usize,
        reason: &'static str,
    },

    /// A line item referenced a product that does not exist.
    #[error("Product with ID {0} not found")]
    ProductNotFound(ProductId),

    /// A product cannot cover the requested quantity.
    #[error("Not enough stock for product: {name}")]
    InsufficientStock {
        product: ProductId,
        name: String,
        /// Total units requested across the order.
        requested: u32,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
