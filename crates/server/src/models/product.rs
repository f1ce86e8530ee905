//! Product domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tidewear_core::{Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Image reference (URL or asset path).
    #[serde(rename = "img")]
    pub image: String,
    /// Shown with a "new" badge.
    pub is_new: bool,
    /// Shown with a "sale" badge.
    pub is_on_sale: bool,
    /// Shown with a "best seller" badge.
    pub is_best_seller: bool,
    /// Category label used for filtering.
    pub category: String,
    /// Units in stock.
    pub quantity: u32,
    /// When the product was added to the catalog.
    pub created_at: DateTime<Utc>,
}

/// A validated product ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub image: String,
    pub is_new: bool,
    pub is_on_sale: bool,
    pub is_best_seller: bool,
    pub category: String,
    pub quantity: u32,
}

/// A validated partial update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub image: Option<String>,
    pub is_new: Option<bool>,
    pub is_on_sale: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub category: Option<String>,
    pub quantity: Option<u32>,
}

impl ProductChanges {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.image.is_none()
            && self.is_new.is_none()
            && self.is_on_sale.is_none()
            && self.is_best_seller.is_none()
            && self.category.is_none()
            && self.quantity.is_none()
    }

    /// Apply the changes to an existing product in place.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(flag) = self.is_new {
            product.is_new = flag;
        }
        if let Some(flag) = self.is_on_sale {
            product.is_on_sale = flag;
        }
        if let Some(flag) = self.is_best_seller {
            product.is_best_seller = flag;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
    }
}

/// Errors from validating admin product input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProductValidationError {
    /// A required field was not supplied.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A text field was empty or whitespace.
    #[error("{0} cannot be empty")]
    Blank(&'static str),

    /// Stock quantity outside `0..=i32::MAX`.
    #[error("quantity must be a non-negative integer (got {0})")]
    InvalidQuantity(i64),
}

/// Product fields as submitted by an admin client.
///
/// Used for both creation (where `name`, `price`, `img` and `category` are
/// required) and partial updates (where everything is optional).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub img: Option<String>,
    pub is_new: Option<bool>,
    pub is_on_sale: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
}

impl ProductInput {
    /// Validate as a complete new product.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductValidationError`] found.
    pub fn into_new_product(self) -> Result<NewProduct, ProductValidationError> {
        let name = required_text(self.name, "name")?;
        let price = self
            .price
            .ok_or(ProductValidationError::MissingField("price"))?;
        let image = required_text(self.img, "img")?;
        let category = required_text(self.category, "category")?;
        let quantity = self.quantity.map(stock_quantity).transpose()?.unwrap_or(0);

        Ok(NewProduct {
            name,
            price,
            image,
            is_new: self.is_new.unwrap_or(false),
            is_on_sale: self.is_on_sale.unwrap_or(false),
            is_best_seller: self.is_best_seller.unwrap_or(false),
            category,
            quantity,
        })
    }

    /// Validate as a partial update.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductValidationError`] found.
    pub fn into_changes(self) -> Result<ProductChanges, ProductValidationError> {
        Ok(ProductChanges {
            name: self
                .name
                .map(|name| required_text(Some(name), "name"))
                .transpose()?,
            price: self.price,
            image: self
                .img
                .map(|img| required_text(Some(img), "img"))
                .transpose()?,
            is_new: self.is_new,
            is_on_sale: self.is_on_sale,
            is_best_seller: self.is_best_seller,
            category: self
                .category
                .map(|category| required_text(Some(category), "category"))
                .transpose()?,
            quantity: self.quantity.map(stock_quantity).transpose()?,
        })
    }
}

fn required_text(
    value: Option<String>,
    field: &'static str,
) -> Result<String, ProductValidationError> {
    let value = value.ok_or(ProductValidationError::MissingField(field))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProductValidationError::Blank(field));
    }
    Ok(trimmed.to_owned())
}

// Stock is stored as a Postgres INTEGER, so the upper bound is i32::MAX.
fn stock_quantity(raw: i64) -> Result<u32, ProductValidationError> {
    i32::try_from(raw)
        .ok()
        .and_then(|q| u32::try_from(q).ok())
        .ok_or(ProductValidationError::InvalidQuantity(raw))
}
