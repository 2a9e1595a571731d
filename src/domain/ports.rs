use crate::domain::model::{
    Customer, Group, NewCustomer, NewProduct, NewUser, Order, OrderChanges, OrderDraft, Product,
    SessionUser, User,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn user_groups(&self, user_id: i64) -> Result<Vec<String>>;
    async fn ensure_group(&self, name: &str) -> Result<Group>;
    /// Fails with `NotFound` when the group does not exist.
    async fn add_user_to_group(&self, user_id: i64, group: &str) -> Result<()>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, user_id: i64, expires_at: DateTime<Utc>) -> Result<String>;
    /// Returns `None` for unknown or expired tokens.
    async fn resolve_session(&self, token: &str) -> Result<Option<SessionUser>>;
    async fn delete_session(&self, token: &str) -> Result<()>;
    async fn purge_expired_sessions(&self) -> Result<u64>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer>;
    async fn list_customers(&self) -> Result<Vec<Customer>>;
    async fn get_customer(&self, id: i64) -> Result<Option<Customer>>;
    async fn customer_for_user(&self, user_id: i64) -> Result<Option<Customer>>;
    async fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(&self, product: NewProduct) -> Result<Product>;
    async fn list_products(&self) -> Result<Vec<Product>>;
    async fn get_product(&self, id: i64) -> Result<Option<Product>>;
    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;
    async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>>;
    async fn get_order(&self, id: i64) -> Result<Option<Order>>;
    /// Inserts every draft in a single transaction.
    async fn create_orders(&self, customer_id: i64, drafts: &[OrderDraft]) -> Result<Vec<i64>>;
    async fn update_order(&self, id: i64, changes: &OrderChanges) -> Result<()>;
    async fn delete_order(&self, id: i64) -> Result<()>;
}

/// Everything the web surface needs from persistence.
pub trait Store:
    UserRepository + SessionRepository + CustomerRepository + ProductRepository + OrderRepository
{
}

impl<T> Store for T where
    T: UserRepository + SessionRepository + CustomerRepository + ProductRepository + OrderRepository
{
}

pub trait ConfigProvider: Send + Sync {
    fn bind_address(&self) -> &str;
    fn database_url(&self) -> &str;
    fn max_connections(&self) -> u32;
    fn session_ttl_minutes(&self) -> i64;
    fn secure_cookies(&self) -> bool;
}
