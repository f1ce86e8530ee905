//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and bearer-token resolution
//! - `catalog` - Catalog search, home page and admin product management
//! - `orders` - Order placement with stock decrement, and order history
//!
//! Services borrow their repositories from `AppState` for the length of a
//! request; they hold no state of their own.

pub mod auth;
pub mod catalog;
pub mod orders;

pub use auth::{AuthError, AuthService, Session};
pub use catalog::{CatalogError, CatalogService};
pub use orders::{OrderError, OrderService};
