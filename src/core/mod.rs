pub mod access;
pub mod accounts;
pub mod dashboard;
pub mod filters;
pub mod forms;
pub mod orders;
pub mod seed;

pub use crate::domain::model::{Customer, Order, OrderStatus, Product, SessionUser, Viewer};
pub use crate::domain::ports::{ConfigProvider, Store};
pub use crate::utils::error::Result;
