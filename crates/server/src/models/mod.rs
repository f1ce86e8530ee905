//! Domain models for the shop.
//!
//! - [`product`] - catalog products, admin input and partial updates
//! - [`user`] - accounts
//! - [`order`] - orders and their line-item snapshots

pub mod order;
pub mod product;
pub mod user;

pub use order::{
    LineItem, LineItemDetail, LineItemInput, NewOrder, Order, OrderDetail, OrderInput,
    StockDecrement,
};
pub use product::{NewProduct, Product, ProductChanges, ProductInput, ProductValidationError};
pub use user::{NewUser, User};
