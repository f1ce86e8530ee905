//! `PostgreSQL` implementations of the repositories.
//!
//! Queries are built at runtime (`sqlx::query_as` and `QueryBuilder`), so the
//! crate compiles without a live database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use tidewear_core::{Email, OrderId, Price, ProductId, Uuid, UserId};

use super::products::{CatalogFilter, SortOrder};
use super::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::{
    LineItem, NewOrder, NewProduct, NewUser, Order, Product, ProductChanges, User,
};

// =============================================================================
// Products
// =============================================================================

const PRODUCT_COLUMNS: &str =
    "id, name, price, img, is_new, is_on_sale, is_best_seller, category, quantity, created_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Price,
    img: String,
    is_new: bool,
    is_on_sale: bool,
    is_best_seller: bool,
    category: String,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative stock {} for product {}",
                row.quantity, row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            price: row.price,
            image: row.img,
            is_new: row.is_new,
            is_on_sale: row.is_on_sale,
            is_best_seller: row.is_best_seller,
            category: row.category,
            quantity,
            created_at: row.created_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

fn stock_column(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("stock {quantity} out of range")))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CatalogFilter) {
    let mut keyword = " WHERE ";
    if let Some(category) = &filter.category {
        builder
            .push(keyword)
            .push("category = ")
            .push_bind(category.clone());
        keyword = " AND ";
    }
    if let Some(min) = filter.min_price {
        builder.push(keyword).push("price >= ").push_bind(min);
        keyword = " AND ";
    }
    if let Some(max) = filter.max_price {
        builder.push(keyword).push("price <= ").push_bind(max);
    }
}

/// Product repository backed by `catalog.product`.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO catalog.product \
                 (id, name, price, img, is_new, is_on_sale, is_best_seller, category, quantity) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(ProductId::generate())
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.image)
            .bind(product.is_new)
            .bind(product.is_on_sale)
            .bind(product.is_best_seller)
            .bind(&product.category)
            .bind(stock_column(product.quantity)?)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM catalog.product WHERE id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product WHERE id = ANY($1) ORDER BY seq"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(uuids)
            .fetch_all(&self.pool)
            .await?;

        into_products(rows)
    }

    async fn list(&self, limit: Option<u64>) -> Result<Vec<Product>, RepositoryError> {
        // LIMIT NULL means no limit
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM catalog.product ORDER BY seq LIMIT $1");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit.map(to_i64))
            .fetch_all(&self.pool)
            .await?;

        into_products(rows)
    }

    async fn search(
        &self,
        filter: &CatalogFilter,
        sort: SortOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product"
        ));
        push_filter(&mut builder, filter);

        builder.push(match sort {
            SortOrder::StoreDefault => " ORDER BY seq",
            SortOrder::PriceAscending => " ORDER BY price ASC, seq",
            SortOrder::PriceDescending => " ORDER BY price DESC, seq",
        });
        builder.push(" OFFSET ").push_bind(to_i64(offset));
        builder.push(" LIMIT ").push_bind(to_i64(limit));

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        into_products(rows)
    }

    async fn count(&self, filter: &CatalogFilter) -> Result<u64, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM catalog.product");
        push_filter(&mut builder, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative row count {count}")))
    }

    async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar::<_, String>(
            r#"SELECT DISTINCT category COLLATE "C" AS category FROM catalog.product ORDER BY category"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "UPDATE catalog.product SET \
                 name = COALESCE($2, name), \
                 price = COALESCE($3, price), \
                 img = COALESCE($4, img), \
                 is_new = COALESCE($5, is_new), \
                 is_on_sale = COALESCE($6, is_on_sale), \
                 is_best_seller = COALESCE($7, is_best_seller), \
                 category = COALESCE($8, category), \
                 quantity = COALESCE($9, quantity), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let quantity = changes.quantity.map(stock_column).transpose()?;
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.price)
            .bind(changes.image)
            .bind(changes.is_new)
            .bind(changes.is_on_sale)
            .bind(changes.is_best_seller)
            .bind(changes.category)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM catalog.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM catalog.product")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// Users
// =============================================================================

const USER_COLUMNS: &str = "id, name, email, is_admin, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: Email,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// User repository backed by `identity.user`.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            r#"INSERT INTO identity."user" (id, name, email, password_hash)
               VALUES ($1, $2, $3, $4)
               RETURNING {USER_COLUMNS}"#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(UserId::generate())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| super::conflict_on_unique(e, "email"))?;

        Ok(row.into())
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM identity."user" WHERE id = $1"#);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM identity."user" WHERE email = $1"#);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!(
            r#"SELECT {USER_COLUMNS}, password_hash FROM identity."user" WHERE email = $1"#
        );
        let row = sqlx::query_as::<_, UserWithPasswordRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    async fn set_admin(
        &self,
        email: &Email,
        is_admin: bool,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            r#"UPDATE identity."user" SET is_admin = $2, updated_at = now()
               WHERE email = $1
               RETURNING {USER_COLUMNS}"#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .bind(is_admin)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total_price: Price,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    name: String,
    quantity: i32,
    price: Price,
}

/// Order repository backed by `sales.order` and `sales.order_item`.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn place(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Take stock first. Rows are locked in ID order so two checkouts over
        // the same products cannot deadlock.
        let mut decrements = order.stock_decrements();
        decrements.sort_by_key(|d| d.product);
        for decrement in &decrements {
            let Ok(quantity) = i32::try_from(decrement.quantity) else {
                tx.rollback().await?;
                return Err(RepositoryError::InsufficientStock(decrement.product));
            };

            let result = sqlx::query(
                "UPDATE catalog.product \
                 SET quantity = quantity - $2, updated_at = now() \
                 WHERE id = $1 AND quantity >= $2",
            )
            .bind(decrement.product)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(RepositoryError::InsufficientStock(decrement.product));
            }
        }

        sqlx::query(
            r#"INSERT INTO sales."order" (id, user_id, total_price, created_at)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(order.id)
        .bind(order.user)
        .bind(order.total_price)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            let position = i32::try_from(position).map_err(|_| {
                RepositoryError::DataCorruption(format!("line item position {position}"))
            })?;

            sqlx::query(
                "INSERT INTO sales.order_item \
                     (order_id, position, product_id, name, quantity, price) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order.id)
            .bind(position)
            .bind(item.product)
            .bind(&item.name)
            .bind(stock_column(item.quantity)?)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order.into_order())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"SELECT id, user_id, total_price, created_at
               FROM sales."order"
               WHERE user_id = $1
               ORDER BY created_at, id"#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, name, quantity, price \
             FROM sales.order_item \
             WHERE order_id = ANY($1) \
             ORDER BY order_id, position",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<OrderId, Vec<LineItem>> = HashMap::new();
        for row in items {
            let quantity = u32::try_from(row.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "line item quantity {} in order {}",
                    row.quantity, row.order_id
                ))
            })?;
            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(LineItem {
                    product: row.product_id,
                    name: row.name,
                    quantity,
                    price: row.price,
                });
        }

        Ok(orders
            .into_iter()
            .map(|row| Order {
                id: row.id,
                user: row.user_id,
                order_items: items_by_order.remove(&row.id).unwrap_or_default(),
                total_price: row.total_price,
                created_at: row.created_at,
            })
            .collect())
    }
}
