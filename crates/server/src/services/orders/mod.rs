//! Order placement and history.
//!
//! Placing an order runs in three steps:
//!
//! 1. Validate the checkout request into line items.
//! 2. Pre-check the whole batch against current stock, with quantities for
//!    the same product summed. Nothing is written if any item fails.
//! 3. Commit the order and its stock decrements as one atomic repository
//!    operation. A checkout that loses a race for the last units fails here
//!    with the same insufficient-stock error and leaves nothing behind.

mod error;

pub use error::OrderError;

use std::collections::HashMap;

use chrono::Utc;
use tracing::instrument;

use tidewear_core::{OrderId, Price, ProductId};

use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::models::{LineItem, NewOrder, Order, OrderDetail, OrderInput, User};

// Line-item quantities are stored as Postgres INTEGER.
const MAX_LINE_QUANTITY: u32 = i32::MAX.unsigned_abs();

/// A validated checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub items: Vec<LineItem>,
    pub total_price: Price,
}

impl CheckoutRequest {
    /// Validate a checkout body.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyOrder` if there are no items, or
    /// `OrderError::InvalidLineItem` for the first item with a blank name or a
    /// quantity below 1.
    pub fn from_input(input: OrderInput) -> Result<Self, OrderError> {
        if input.order_items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let items = input
            .order_items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let name = item.name.as_deref().map(str::trim).unwrap_or_default();
                if name.is_empty() {
                    return Err(OrderError::InvalidLineItem {
                        index,
                        reason: "name is required",
                    });
                }
                if item.quantity < 1 {
                    return Err(OrderError::InvalidLineItem {
                        index,
                        reason: "quantity must be at least 1",
                    });
                }
                let quantity = u32::try_from(item.quantity)
                    .ok()
                    .filter(|&q| q <= MAX_LINE_QUANTITY)
                    .ok_or(OrderError::InvalidLineItem {
                        index,
                        reason: "quantity is too large",
                    })?;

                Ok(LineItem {
                    product: item.product,
                    name: name.to_owned(),
                    quantity,
                    price: item.price,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            items,
            total_price: input.total_price,
        })
    }
}

/// Order service over the product and order repositories.
pub struct OrderService<'a> {
    products: &'a dyn ProductRepository,
    orders: &'a dyn OrderRepository,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        products: &'a dyn ProductRepository,
        orders: &'a dyn OrderRepository,
    ) -> Self {
        Self { products, orders }
    }

    /// Place an order for `user`, taking stock for every line item.
    ///
    /// Line-item names and prices are stored as submitted. A `total_price`
    /// that does not match the line items is logged, not rejected.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::ProductNotFound` if a product does not exist.
    /// Returns `OrderError::InsufficientStock` if a product cannot cover the
    /// summed quantity requested for it.
    /// Returns `OrderError::Repository` if the store fails.
    #[instrument(
        skip(self, user, request),
        fields(
            user_id = %user.id,
            items = request.items.len(),
            order_id = tracing::field::Empty
        )
    )]
    pub async fn place_order(
        &self,
        user: &User,
        request: CheckoutRequest,
    ) -> Result<Order, OrderError> {
        let new_order = NewOrder {
            id: OrderId::generate(),
            user: user.id,
            items: request.items,
            total_price: request.total_price,
            created_at: Utc::now(),
        };
        tracing::Span::current().record("order_id", tracing::field::display(new_order.id));

        // All-or-nothing pre-check over the whole batch.
        let mut names: HashMap<ProductId, String> = HashMap::new();
        for decrement in new_order.stock_decrements() {
            let product = self
                .products
                .get(decrement.product)
                .await?
                .ok_or(OrderError::ProductNotFound(decrement.product))?;

            if product.quantity < decrement.quantity {
                tracing::info!(
                    product_id = %product.id,
                    requested = decrement.quantity,
                    available = product.quantity,
                    "order rejected: insufficient stock"
                );
                return Err(OrderError::InsufficientStock {
                    product: product.id,
                    name: product.name,
                    requested: decrement.quantity,
                });
            }
            names.insert(product.id, product.name);
        }

        match new_order.items_total() {
            Some(total) if total == new_order.total_price => {}
            Some(total) => tracing::warn!(
                submitted = %new_order.total_price,
                computed = %total,
                "order total does not match line items"
            ),
            None => tracing::warn!(
                submitted = %new_order.total_price,
                "order line items add up past the largest storable price"
            ),
        }

        let requested: HashMap<ProductId, u32> = new_order
            .stock_decrements()
            .into_iter()
            .map(|d| (d.product, d.quantity))
            .collect();

        match self.orders.place(new_order).await {
            Ok(order) => {
                tracing::info!(total = %order.total_price, "order placed");
                Ok(order)
            }
            Err(RepositoryError::InsufficientStock(product)) => {
                tracing::info!(product_id = %product, "order lost a race for stock");
                Err(OrderError::InsufficientStock {
                    product,
                    name: names.remove(&product).unwrap_or_default(),
                    requested: requested.get(&product).copied().unwrap_or_default(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A user's orders with each line item's current product expanded.
    ///
    /// Products deleted since the order was placed expand to `None`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the store fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn orders_for(&self, user: &User) -> Result<Vec<OrderDetail>, OrderError> {
        let orders = self.orders.list_for_user(user.id).await?;

        let mut ids: Vec<ProductId> = orders
            .iter()
            .flat_map(|o| o.order_items.iter().map(|item| item.product))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let products = self
            .products
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| OrderDetail::expand(order, &products))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tidewear_core::{Email, UserId};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{LineItemInput, NewProduct};

    fn shopper() -> User {
        User {
            id: UserId::generate(),
            name: "Shopper".to_owned(),
            email: Email::parse("shopper@example.com").unwrap(),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    async fn stock(store: &MemoryStore, name: &str, quantity: u32) -> ProductId {
        ProductRepository::create(
            store,
            NewProduct {
                name: name.to_owned(),
                price: Price::from_cents(1000).unwrap(),
                image: "images/product.jpg".to_owned(),
                is_new: false,
                is_on_sale: false,
                is_best_seller: false,
                category: "Bags".to_owned(),
                quantity,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn checkout(items: &[(ProductId, u32)]) -> CheckoutRequest {
        let items: Vec<LineItem> = items
            .iter()
            .map(|&(product, quantity)| LineItem {
                product,
                name: "Chest Bag".to_owned(),
                quantity,
                price: Price::from_cents(1000).unwrap(),
            })
            .collect();
        let total_price = items
            .iter()
            .try_fold(Price::ZERO, |total, item| total.checked_add(item.subtotal()?))
            .unwrap();
        CheckoutRequest { items, total_price }
    }

    async fn quantity_of(store: &MemoryStore, id: ProductId) -> u32 {
        store.get(id).await.unwrap().unwrap().quantity
    }

    #[test]
    fn test_checkout_validation() {
        let input = |items: Vec<LineItemInput>| OrderInput {
            order_items: items,
            total_price: Price::ZERO,
        };
        let line = |name: Option<&str>, quantity: i64| LineItemInput {
            product: ProductId::generate(),
            name: name.map(str::to_owned),
            quantity,
            price: Price::ZERO,
        };

        assert!(matches!(
            CheckoutRequest::from_input(input(vec![])),
            Err(OrderError::EmptyOrder)
        ));
        assert!(matches!(
            CheckoutRequest::from_input(input(vec![line(Some("Cap"), 1), line(Some("Cap"), 0)])),
            Err(OrderError::InvalidLineItem { index: 1, .. })
        ));
        assert!(matches!(
            CheckoutRequest::from_input(input(vec![line(None, 1)])),
            Err(OrderError::InvalidLineItem { index: 0, .. })
        ));

        let request = CheckoutRequest::from_input(input(vec![line(Some(" Cap "), 2)])).unwrap();
        assert_eq!(request.items[0].name, "Cap");
        assert_eq!(request.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_two_orders_against_one_product() {
        let store = MemoryStore::new();
        let service = OrderService::new(&store, &store);
        let user = shopper();
        let bag = stock(&store, "Chest Bag", 10).await;

        let order = service
            .place_order(&user, checkout(&[(bag, 3), (bag, 4)]))
            .await
            .unwrap();
        assert_eq!(order.order_items.len(), 2);
        assert_eq!(order.user, user.id);
        assert_eq!(quantity_of(&store, bag).await, 3);

        let err = service
            .place_order(&user, checkout(&[(bag, 5)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InsufficientStock { product, ref name, requested: 5 }
                if product == bag && name == "Chest Bag"
        ));
        assert_eq!(quantity_of(&store, bag).await, 3);
    }

    #[tokio::test]
    async fn test_failing_item_leaves_all_stock_untouched() {
        let store = MemoryStore::new();
        let service = OrderService::new(&store, &store);
        let user = shopper();
        let plenty = stock(&store, "Jacket", 20).await;
        let scarce = stock(&store, "Cap", 1).await;

        let err = service
            .place_order(&user, checkout(&[(plenty, 2), (scarce, 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { product, .. } if product == scarce));

        assert_eq!(quantity_of(&store, plenty).await, 20);
        assert_eq!(quantity_of(&store, scarce).await, 1);
        assert!(service.orders_for(&user).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let store = MemoryStore::new();
        let bag = stock(&store, "Chest Bag", 7).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let user = shopper();
                tokio::spawn(async move {
                    OrderService::new(&store, &store)
                        .place_order(&user, checkout(&[(bag, 2)]))
                        .await
                })
            })
            .collect();

        let mut placed = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(OrderError::InsufficientStock { product, requested: 2, .. })
                    if product == bag =>
                {
                    refused += 1;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(placed, 3);
        assert_eq!(refused, 5);
        assert_eq!(quantity_of(&store, bag).await, 1);
    }

    /// Commits a rival order right before each checkout's own commit, after
    /// the stock pre-check has already passed.
    struct OutrunOrders {
        store: MemoryStore,
        rival: std::sync::Mutex<Option<NewOrder>>,
    }

    #[async_trait::async_trait]
    impl OrderRepository for OutrunOrders {
        async fn place(&self, order: NewOrder) -> Result<Order, RepositoryError> {
            let rival = self.rival.lock().unwrap().take();
            if let Some(rival) = rival {
                self.store.place(rival).await?;
            }
            self.store.place(order).await
        }

        async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
            self.store.list_for_user(user).await
        }
    }

    #[tokio::test]
    async fn test_checkout_losing_the_race_takes_nothing() {
        let store = MemoryStore::new();
        let bag = stock(&store, "Chest Bag", 5).await;
        let rival = checkout(&[(bag, 3)]);
        let orders = OutrunOrders {
            store: store.clone(),
            rival: std::sync::Mutex::new(Some(NewOrder {
                id: OrderId::generate(),
                user: UserId::generate(),
                items: rival.items,
                total_price: rival.total_price,
                created_at: Utc::now(),
            })),
        };
        let service = OrderService::new(&store, &orders);
        let user = shopper();

        let err = service
            .place_order(&user, checkout(&[(bag, 4)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InsufficientStock { product, ref name, requested: 4 }
                if product == bag && name == "Chest Bag"
        ));

        // Only the rival's units are gone
        assert_eq!(quantity_of(&store, bag).await, 2);
        assert!(service.orders_for(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let store = MemoryStore::new();
        let service = OrderService::new(&store, &store);
        let missing = ProductId::generate();

        let err = service
            .place_order(&shopper(), checkout(&[(missing, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ProductNotFound(id) if id == missing));
        assert!(err.to_string().contains(&missing.to_string()));
    }

    #[tokio::test]
    async fn test_mismatched_total_is_accepted() {
        let store = MemoryStore::new();
        let service = OrderService::new(&store, &store);
        let bag = stock(&store, "Chest Bag", 5).await;

        let mut request = checkout(&[(bag, 1)]);
        request.total_price = Price::from_cents(1).unwrap();
        let order = service.place_order(&shopper(), request).await.unwrap();
        assert_eq!(order.total_price, Price::from_cents(1).unwrap());
    }

    #[tokio::test]
    async fn test_history_expands_products() {
        let store = MemoryStore::new();
        let service = OrderService::new(&store, &store);
        let user = shopper();
        let kept = stock(&store, "Jacket", 5).await;
        let deleted = stock(&store, "Cap", 5).await;

        service
            .place_order(&user, checkout(&[(kept, 1), (deleted, 1)]))
            .await
            .unwrap();
        store.delete(deleted).await.unwrap();

        let history = service.orders_for(&user).await.unwrap();
        assert_eq!(history.len(), 1);
        let items = &history[0].order_items;
        assert_eq!(items[0].product.as_ref().map(|p| p.id), Some(kept));
        assert!(items[1].product.is_none());
        assert_eq!(items[1].name, "Chest Bag");

        assert!(service.orders_for(&shopper()).await.unwrap().is_empty());
    }
}
