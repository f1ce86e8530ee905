//! Order domain types.
//!
//! An order stores a snapshot of each purchased line item (name and price as
//! submitted at checkout). The product reference is weak: the product may be
//! deleted later and the order stays valid.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tidewear_core::{OrderId, Price, ProductId, UserId};

use super::product::Product;

/// One purchased product within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product the item refers to.
    pub product: ProductId,
    /// Product name at checkout time.
    pub name: String,
    /// Units purchased (at least 1).
    pub quantity: u32,
    /// Unit price at checkout time.
    pub price: Price,
}

impl LineItem {
    /// Unit price times quantity, or `None` if it exceeds [`Price::MAX`].
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        self.price.checked_times(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Owning user.
    pub user: UserId,
    pub order_items: Vec<LineItem>,
    /// Total as submitted by the client.
    pub total_price: Price,
    pub created_at: DateTime<Utc>,
}

/// The amount of stock one order takes from one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    pub product: ProductId,
    pub quantity: u32,
}

/// An order that has passed validation and is ready to be committed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub user: UserId,
    pub items: Vec<LineItem>,
    pub total_price: Price,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Stock to take per product, with repeated products summed.
    ///
    /// Products appear in the order they are first mentioned in the line items.
    #[must_use]
    pub fn stock_decrements(&self) -> Vec<StockDecrement> {
        let mut decrements: Vec<StockDecrement> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match decrements.iter_mut().find(|d| d.product == item.product) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => decrements.push(StockDecrement {
                    product: item.product,
                    quantity: item.quantity,
                }),
            }
        }
        decrements
    }

    /// Sum of the line-item subtotals, or `None` if it exceeds
    /// [`Price::MAX`].
    #[must_use]
    pub fn items_total(&self) -> Option<Price> {
        self.items
            .iter()
            .try_fold(Price::ZERO, |total, item| total.checked_add(item.subtotal()?))
    }

    /// The order as it looks once committed.
    #[must_use]
    pub fn into_order(self) -> Order {
        Order {
            id: self.id,
            user: self.user,
            order_items: self.items,
            total_price: self.total_price,
            created_at: self.created_at,
        }
    }
}

/// A line item with its product expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDetail {
    /// The current product, or `None` if it has since been deleted.
    pub product: Option<Product>,
    pub name: String,
    pub quantity: u32,
    pub price: Price,
}

/// An order with its line items' products expanded, for order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: OrderId,
    pub user: UserId,
    pub order_items: Vec<LineItemDetail>,
    pub total_price: Price,
    pub created_at: DateTime<Utc>,
}

impl OrderDetail {
    /// Expand an order using a lookup of current products.
    #[must_use]
    pub fn expand(order: Order, products: &HashMap<ProductId, Product>) -> Self {
        Self {
            id: order.id,
            user: order.user,
            order_items: order
                .order_items
                .into_iter()
                .map(|item| LineItemDetail {
                    product: products.get(&item.product).cloned(),
                    name: item.name,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            total_price: order.total_price,
            created_at: order.created_at,
        }
    }
}

/// Checkout request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    #[serde(default)]
    pub order_items: Vec<LineItemInput>,
    pub total_price: Price,
}

/// A line item as submitted at checkout, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub product: ProductId,
    pub name: Option<String>,
    pub quantity: i64,
    pub price: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(product: ProductId, quantity: u32, cents: i64) -> LineItem {
        LineItem {
            product,
            name: "Canvas Tote".to_owned(),
            quantity,
            price: Price::from_cents(cents).unwrap(),
        }
    }

    #[test]
    fn test_stock_decrements_sum_repeated_products() {
        let tote = ProductId::generate();
        let cap = ProductId::generate();
        let order = NewOrder {
            id: OrderId::generate(),
            user: UserId::generate(),
            items: vec![item(tote, 3, 1000), item(cap, 1, 500), item(tote, 4, 1000)],
            total_price: Price::from_cents(7500).unwrap(),
            created_at: Utc::now(),
        };

        assert_eq!(
            order.stock_decrements(),
            vec![
                StockDecrement {
                    product: tote,
                    quantity: 7
                },
                StockDecrement {
                    product: cap,
                    quantity: 1
                },
            ]
        );
        assert_eq!(order.items_total(), Some(Price::from_cents(7500).unwrap()));
    }

    #[test]
    fn test_items_total_out_of_range() {
        let mut line = item(ProductId::generate(), 2, 0);
        line.price = Price::MAX;
        assert_eq!(line.subtotal(), None);

        let order = NewOrder {
            id: OrderId::generate(),
            user: UserId::generate(),
            items: vec![line],
            total_price: Price::ZERO,
            created_at: Utc::now(),
        };
        assert_eq!(order.items_total(), None);
    }

    #[test]
    fn test_expand_marks_deleted_products() {
        let gone = ProductId::generate();
        let order = Order {
            id: OrderId::generate(),
            user: UserId::generate(),
            order_items: vec![item(gone, 1, 1000)],
            total_price: Price::from_cents(1000).unwrap(),
            created_at: Utc::now(),
        };

        let detail = OrderDetail::expand(order, &HashMap::new());
        let json = serde_json::to_value(&detail).unwrap();
        assert!(json["orderItems"][0]["product"].is_null());
        assert_eq!(json["orderItems"][0]["name"], "Canvas Tote");
        assert_eq!(json["totalPrice"], 10.0);
    }

    #[test]
    fn test_order_input_defaults_to_no_items() {
        let input: OrderInput = serde_json::from_str(r#"{"totalPrice": 0}"#).unwrap();
        assert!(input.order_items.is_empty());
    }
}
