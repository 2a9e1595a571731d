//! SQLite persistence for every repository port.
//!
//! Schema lives in `migrations/` and is embedded at compile time. Timestamps are
//! stored as RFC 3339 text, except session expiry which is unix seconds so that
//! expiry checks are plain integer comparisons.

use crate::domain::model::{
    Category, Customer, Group, NewCustomer, NewProduct, NewUser, Order, OrderChanges, OrderDraft,
    Product, SessionUser, User,
};
use crate::domain::ports::{
    CustomerRepository, OrderRepository, ProductRepository, SessionRepository, UserRepository,
};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            // The database lives only as long as one connection stays open.
            pool_options
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections)
        };

        tracing::debug!("Connecting to {} (in_memory={})", url, in_memory);
        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Fresh in-memory database with migrations applied.
    pub async fn in_memory() -> Result<Self> {
        let store = Self::connect("sqlite::memory:", 1).await?;
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn tags_by_product(&self) -> Result<HashMap<i64, Vec<String>>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT pt.product_id, t.name FROM product_tags pt \
             JOIN tag t ON t.id = pt.tag_id ORDER BY t.name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
        for (product_id, name) in rows {
            tags.entry(product_id).or_default().push(name);
        }
        Ok(tags)
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: Option<String>,
    password_hash: String,
    date_joined: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            date_joined: row.date_joined,
        }
    }
}

#[derive(FromRow)]
struct CustomerRow {
    id: i64,
    user_id: Option<i64>,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    date_created: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            date_created: row.date_created,
        }
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: f64,
    category: Option<String>,
    description: Option<String>,
    date_created: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, tags: Vec<String>) -> Product {
        Product {
            id: self.id,
            name: self.name,
            price: self.price,
            category: self.category.and_then(|c| Category::from_str(&c).ok()),
            description: self.description,
            date_created: self.date_created,
            tags,
        }
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: i64,
    customer_id: Option<i64>,
    customer_name: Option<String>,
    product_id: Option<i64>,
    product_name: Option<String>,
    status: Option<String>,
    note: Option<String>,
    date_created: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            product_id: row.product_id,
            product_name: row.product_name,
            status: row.status.and_then(|s| s.parse().ok()),
            note: row.note,
            date_created: row.date_created,
        }
    }
}

const USER_COLUMNS: &str = "SELECT id, username, email, password_hash, date_joined FROM auth_user";
const CUSTOMER_COLUMNS: &str =
    "SELECT id, user_id, name, phone, email, date_created FROM customer";
const PRODUCT_COLUMNS: &str =
    "SELECT id, name, price, category, description, date_created FROM product";
const ORDER_COLUMNS: &str = "SELECT o.id, o.customer_id, c.name AS customer_name, \
     o.product_id, p.name AS product_name, o.status, o.note, o.date_created \
     FROM orders o \
     LEFT JOIN customer c ON c.id = o.customer_id \
     LEFT JOIN product p ON p.id = o.product_id";

#[async_trait]
impl UserRepository for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let date_joined = Utc::now();
        let result = sqlx::query(
            "INSERT INTO auth_user (username, email, password_hash, date_joined) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(date_joined)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::ValidationError {
                message: "A user with that username already exists.".to_string(),
            },
            other => AppError::DatabaseError(other),
        })?;

        tracing::info!("Created user '{}'", user.username);
        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            date_joined,
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{USER_COLUMNS} WHERE username = ?"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn user_groups(&self, user_id: i64) -> Result<Vec<String>> {
        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT g.name FROM auth_group g \
             JOIN auth_user_groups ug ON ug.group_id = g.id \
             WHERE ug.user_id = ? ORDER BY g.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names.into_iter().map(|(name,)| name).collect())
    }

    async fn ensure_group(&self, name: &str) -> Result<Group> {
        sqlx::query("INSERT OR IGNORE INTO auth_group (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let (id,): (i64,) = sqlx::query_as("SELECT id FROM auth_group WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(Group {
            id,
            name: name.to_string(),
        })
    }

    async fn add_user_to_group(&self, user_id: i64, group: &str) -> Result<()> {
        let group_id: Option<(i64,)> = sqlx::query_as("SELECT id FROM auth_group WHERE name = ?")
            .bind(group)
            .fetch_optional(&self.pool)
            .await?;
        let (group_id,) = group_id.ok_or_else(|| AppError::not_found("Group", group))?;

        sqlx::query("INSERT OR IGNORE INTO auth_user_groups (user_id, group_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for SqliteStore {
    async fn create_session(&self, user_id: i64, expires_at: DateTime<Utc>) -> Result<String> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO session (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(expires_at.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<SessionUser>> {
        let row: Option<(i64, String)> = sqlx::query_as(
            "SELECT u.id, u.username FROM session s \
             JOIN auth_user u ON u.id = s.user_id \
             WHERE s.token = ? AND s.expires_at > ?",
        )
        .bind(token)
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((id, username)) => {
                let groups = self.user_groups(id).await?;
                Ok(Some(SessionUser {
                    id,
                    username,
                    groups,
                }))
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM session WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CustomerRepository for SqliteStore {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let date_created = Utc::now();
        let result = sqlx::query(
            "INSERT INTO customer (user_id, name, phone, email, date_created) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(customer.user_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(date_created)
        .execute(&self.pool)
        .await?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            user_id: customer.user_id,
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            date_created,
        })
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!("{CUSTOMER_COLUMNS} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!("{CUSTOMER_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Customer::from))
    }

    async fn customer_for_user(&self, user_id: i64) -> Result<Option<Customer>> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("{CUSTOMER_COLUMNS} WHERE user_id = ?"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Customer::from))
    }

    async fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("{CUSTOMER_COLUMNS} WHERE name = ? LIMIT 1"))
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Customer::from))
    }
}

#[async_trait]
impl ProductRepository for SqliteStore {
    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let date_created = Utc::now();
        let mut tx = self.pool.begin().await?;

        let product_id = sqlx::query(
            "INSERT INTO product (name, price, category, description, date_created) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(product.category.map(|c| c.as_str()))
        .bind(&product.description)
        .bind(date_created)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for tag in &product.tags {
            sqlx::query("INSERT OR IGNORE INTO tag (name) VALUES (?)")
                .bind(tag)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT OR IGNORE INTO product_tags (product_id, tag_id) \
                 SELECT ?, id FROM tag WHERE name = ?",
            )
            .bind(product_id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut tags = product.tags;
        tags.sort();
        tags.dedup();
        Ok(Product {
            id: product_id,
            name: product.name,
            price: product.price,
            category: product.category,
            description: product.description,
            date_created,
            tags,
        })
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("{PRODUCT_COLUMNS} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;
        let mut tags = self.tags_by_product().await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let product_tags = tags.remove(&row.id).unwrap_or_default();
                row.into_product(product_tags)
            })
            .collect())
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("{PRODUCT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let tags = self.tags_by_product().await?.remove(&id).unwrap_or_default();
                Ok(Some(row.into_product(tags)))
            }
            None => Ok(None),
        }
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>> {
        let id: Option<(i64,)> = sqlx::query_as("SELECT id FROM product WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        match id {
            Some((id,)) => self.get_product(id).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl OrderRepository for SqliteStore {
    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("{ORDER_COLUMNS} ORDER BY o.date_created DESC, o.id DESC"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{ORDER_COLUMNS} WHERE o.customer_id = ? ORDER BY o.date_created DESC, o.id DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{ORDER_COLUMNS} WHERE o.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Order::from))
    }

    async fn create_orders(&self, customer_id: i64, drafts: &[OrderDraft]) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let id = sqlx::query(
                "INSERT INTO orders (customer_id, product_id, date_created, status) VALUES (?, ?, ?, ?)",
            )
            .bind(customer_id)
            .bind(draft.product_id)
            .bind(Utc::now())
            .bind(draft.status.as_str())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
            ids.push(id);
        }

        tx.commit().await?;
        tracing::info!("Created {} order(s) for customer {}", ids.len(), customer_id);
        Ok(ids)
    }

    async fn update_order(&self, id: i64, changes: &OrderChanges) -> Result<()> {
        let result = sqlx::query(
            "UPDATE orders SET customer_id = ?, product_id = ?, status = ?, note = ? WHERE id = ?",
        )
        .bind(changes.customer_id)
        .bind(changes.product_id)
        .bind(changes.status.as_str())
        .bind(&changes.note)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Order", id));
        }
        Ok(())
    }

    async fn delete_order(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Order", id));
        }
        tracing::info!("Deleted order {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OrderStatus;

    async fn store_with_catalog() -> (SqliteStore, Customer, Product) {
        let store = SqliteStore::in_memory().await.unwrap();
        let customer = store
            .create_customer(NewCustomer {
                name: "Peter Piper".to_string(),
                phone: Some("555-0101".to_string()),
                email: None,
                user_id: None,
            })
            .await
            .unwrap();
        let product = store
            .create_product(NewProduct {
                name: "BBQ Grill".to_string(),
                price: 200.0,
                category: Some(Category::OutDoor),
                description: None,
                tags: vec!["Summer".to_string(), "Kitchen".to_string()],
            })
            .await
            .unwrap();
        (store, customer, product)
    }

    #[tokio::test]
    async fn test_migration_seeds_default_groups() {
        let store = SqliteStore::in_memory().await.unwrap();
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM auth_group WHERE name IN ('admin', 'customer')",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_validation_error() {
        let store = SqliteStore::in_memory().await.unwrap();
        let new_user = || NewUser {
            username: "dennis".to_string(),
            email: None,
            password_hash: "hash".to_string(),
        };
        store.create_user(new_user()).await.unwrap();

        let err = store.create_user(new_user()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_add_user_to_unknown_group_fails() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store
            .create_user(NewUser {
                username: "dennis".to_string(),
                email: None,
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        let err = store.add_user_to_group(user.id, "staff").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        store.add_user_to_group(user.id, "customer").await.unwrap();
        assert_eq!(store.user_groups(user.id).await.unwrap(), vec!["customer"]);
    }

    #[tokio::test]
    async fn test_expired_session_does_not_resolve() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store
            .create_user(NewUser {
                username: "dennis".to_string(),
                email: None,
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        let live = store
            .create_session(user.id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();
        let stale = store
            .create_session(user.id, Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();

        let resolved = store.resolve_session(&live).await.unwrap().unwrap();
        assert_eq!(resolved.username, "dennis");
        assert!(store.resolve_session(&stale).await.unwrap().is_none());

        assert_eq!(store.purge_expired_sessions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_product_tags_are_loaded_sorted() {
        let (store, _, product) = store_with_catalog().await;
        let loaded = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(loaded.tags, vec!["Kitchen", "Summer"]);
        assert_eq!(loaded.category, Some(Category::OutDoor));
    }

    #[tokio::test]
    async fn test_order_lifecycle() {
        let (store, customer, product) = store_with_catalog().await;
        let drafts = vec![
            OrderDraft {
                product_id: product.id,
                status: OrderStatus::Pending,
            },
            OrderDraft {
                product_id: product.id,
                status: OrderStatus::Delivered,
            },
        ];
        let ids = store.create_orders(customer.id, &drafts).await.unwrap();
        assert_eq!(ids.len(), 2);

        let orders = store.orders_for_customer(customer.id).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].product_name.as_deref(), Some("BBQ Grill"));
        assert_eq!(orders[0].customer_name.as_deref(), Some("Peter Piper"));

        store
            .update_order(
                ids[0],
                &OrderChanges {
                    customer_id: customer.id,
                    product_id: product.id,
                    status: OrderStatus::OutForDelivery,
                    note: Some("leave at the door".to_string()),
                },
            )
            .await
            .unwrap();
        let updated = store.get_order(ids[0]).await.unwrap().unwrap();
        assert_eq!(updated.status, Some(OrderStatus::OutForDelivery));
        assert_eq!(updated.note.as_deref(), Some("leave at the door"));

        store.delete_order(ids[1]).await.unwrap();
        assert!(store.get_order(ids[1]).await.unwrap().is_none());
        assert!(matches!(
            store.delete_order(ids[1]).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_create_orders_is_all_or_nothing() {
        let (store, customer, product) = store_with_catalog().await;
        let drafts = vec![
            OrderDraft {
                product_id: product.id,
                status: OrderStatus::Pending,
            },
            OrderDraft {
                product_id: 9999,
                status: OrderStatus::Pending,
            },
        ];

        assert!(store.create_orders(customer.id, &drafts).await.is_err());
        assert!(store.list_orders().await.unwrap().is_empty());
    }
}
