//! In-memory implementation of every repository.
//!
//! Useful for tests and local development where persistence is not required.
//! One [`MemoryStore`] backs the product, user and order traits together so an
//! order commit can check and take stock under a single write lock.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use tidewear_core::{Email, ProductId, UserId};

use super::products::{CatalogFilter, SortOrder};
use super::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::{NewOrder, NewProduct, NewUser, Order, Product, ProductChanges, User};

#[derive(Default)]
struct State {
    // Vec keeps insertion order, which is the store-default product order.
    products: Vec<Product>,
    users: Vec<StoredUser>,
    orders: Vec<Order>,
}

struct StoredUser {
    user: User,
    password_hash: String,
}

/// Thread-safe in-memory store.
///
/// Cloning is cheap and every clone shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn saturating_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let product = Product {
            id: ProductId::generate(),
            name: product.name,
            price: product.price,
            image: product.image,
            is_new: product.is_new,
            is_on_sale: product.is_on_sale,
            is_best_seller: product.is_best_seller,
            category: product.category,
            quantity: product.quantity,
            created_at: Utc::now(),
        };

        self.state.write().await.products.push(product.clone());
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let wanted: HashSet<&ProductId> = ids.iter().collect();
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .filter(|p| wanted.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list(&self, limit: Option<u64>) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        let take = limit.map_or(usize::MAX, saturating_usize);
        Ok(state.products.iter().take(take).cloned().collect())
    }

    async fn search(
        &self,
        filter: &CatalogFilter,
        sort: SortOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        let mut matching: Vec<&Product> =
            state.products.iter().filter(|p| filter.matches(p)).collect();

        // sort_by is stable, so equal prices keep insertion order
        match sort {
            SortOrder::StoreDefault => {}
            SortOrder::PriceAscending => matching.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::PriceDescending => matching.sort_by(|a, b| b.price.cmp(&a.price)),
        }

        Ok(matching
            .into_iter()
            .skip(saturating_usize(offset))
            .take(saturating_usize(limit))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &CatalogFilter) -> Result<u64, RepositoryError> {
        let state = self.state.read().await;
        let count = state.products.iter().filter(|p| filter.matches(p)).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let state = self.state.read().await;
        let mut categories: Vec<String> =
            state.products.iter().map(|p| p.category.clone()).collect();
        categories.sort_unstable();
        categories.dedup();
        Ok(categories)
    }

    async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(product) = state.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        changes.apply_to(product);
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        Ok(state.products.len() < before)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let mut state = self.state.write().await;
        let removed = state.products.len();
        state.products.clear();
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.user.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::generate(),
            name: user.name,
            email: user.email,
            is_admin: false,
            created_at: Utc::now(),
        };
        state.users.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone()))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| &u.user.email == email)
            .map(|u| u.user.clone()))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| &u.user.email == email)
            .map(|u| (u.user.clone(), u.password_hash.clone())))
    }

    async fn set_admin(
        &self,
        email: &Email,
        is_admin: bool,
    ) -> Result<Option<User>, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(stored) = state.users.iter_mut().find(|u| &u.user.email == email) else {
            return Ok(None);
        };
        stored.user.is_admin = is_admin;
        Ok(Some(stored.user.clone()))
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut state = self.state.write().await;
        let decrements = order.stock_decrements();

        // Verify every decrement before touching anything.
        for decrement in &decrements {
            let covered = state
                .products
                .iter()
                .find(|p| p.id == decrement.product)
                .is_some_and(|p| p.quantity >= decrement.quantity);
            if !covered {
                return Err(RepositoryError::InsufficientStock(decrement.product));
            }
        }

        for decrement in &decrements {
            if let Some(product) = state
                .products
                .iter_mut()
                .find(|p| p.id == decrement.product)
            {
                product.quantity -= decrement.quantity;
            }
        }

        let order = order.into_order();
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.user == user)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tidewear_core::{OrderId, Price};

    use super::*;
    use crate::models::LineItem;

    fn new_product(name: &str, category: &str, cents: i64, quantity: u32) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            price: Price::from_cents(cents).unwrap(),
            image: format!("/img/{name}.jpg"),
            is_new: false,
            is_on_sale: false,
            is_best_seller: false,
            category: category.to_owned(),
            quantity,
        }
    }

    fn order_for(user: UserId, items: Vec<(ProductId, u32)>) -> NewOrder {
        NewOrder {
            id: OrderId::generate(),
            user,
            items: items
                .into_iter()
                .map(|(product, quantity)| LineItem {
                    product,
                    name: "item".to_owned(),
                    quantity,
                    price: Price::ZERO,
                })
                .collect(),
            total_price: Price::ZERO,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_search_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        ProductRepository::create(&store, new_product("a", "Hats", 3000, 1))
            .await
            .unwrap();
        ProductRepository::create(&store, new_product("b", "Shirts", 1000, 1))
            .await
            .unwrap();
        ProductRepository::create(&store, new_product("c", "Shirts", 2000, 1))
            .await
            .unwrap();

        let shirts = CatalogFilter {
            category: Some("Shirts".to_owned()),
            ..CatalogFilter::default()
        };
        assert_eq!(store.count(&shirts).await.unwrap(), 2);

        let cheapest_first = store
            .search(&CatalogFilter::default(), SortOrder::PriceAscending, 0, 10)
            .await
            .unwrap();
        let names: Vec<&str> = cheapest_first.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "a"]);

        let second_page = store
            .search(&CatalogFilter::default(), SortOrder::StoreDefault, 2, 2)
            .await
            .unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].name, "c");
    }

    #[tokio::test]
    async fn test_categories_sorted_and_distinct() {
        let store = MemoryStore::new();
        ProductRepository::create(&store, new_product("a", "Shirts", 100, 1))
            .await
            .unwrap();
        ProductRepository::create(&store, new_product("b", "Hats", 100, 1))
            .await
            .unwrap();
        ProductRepository::create(&store, new_product("c", "Shirts", 100, 1))
            .await
            .unwrap();

        assert_eq!(store.categories().await.unwrap(), ["Hats", "Shirts"]);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let new_user = || NewUser {
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            password_hash: "hash".to_owned(),
        };

        UserRepository::create(&store, new_user()).await.unwrap();
        let err = UserRepository::create(&store, new_user()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_place_takes_stock() {
        let store = MemoryStore::new();
        let product = ProductRepository::create(&store, new_product("p", "Hats", 100, 10))
            .await
            .unwrap();

        store
            .place(order_for(UserId::generate(), vec![(product.id, 3), (product.id, 4)]))
            .await
            .unwrap();

        let product = store.get(product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 3);
    }

    #[tokio::test]
    async fn test_place_is_all_or_nothing() {
        let store = MemoryStore::new();
        let plenty = ProductRepository::create(&store, new_product("p", "Hats", 100, 10))
            .await
            .unwrap();
        let scarce = ProductRepository::create(&store, new_product("q", "Hats", 100, 1))
            .await
            .unwrap();
        let user = UserId::generate();

        let err = store
            .place(order_for(user, vec![(plenty.id, 2), (scarce.id, 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InsufficientStock(id) if id == scarce.id));

        assert_eq!(store.get(plenty.id).await.unwrap().unwrap().quantity, 10);
        assert!(store.list_for_user(user).await.unwrap().is_empty());
    }
}
