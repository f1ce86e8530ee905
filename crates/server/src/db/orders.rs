//! Order repository interface.

use async_trait::async_trait;

use tidewear_core::UserId;

use super::RepositoryError;
use crate::models::{NewOrder, Order};

/// Access to placed orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Commit an order and take its stock, atomically.
    ///
    /// Every product named in [`NewOrder::stock_decrements`] is decremented
    /// only if it still holds enough stock. If any product falls short the
    /// whole commit is abandoned: no order is stored and no stock changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InsufficientStock` naming the first product
    /// that could not cover its decrement (including products that no longer
    /// exist).
    async fn place(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// All orders placed by a user, oldest first.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError>;
}
