use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ADMIN_GROUP: &str = "admin";
pub const CUSTOMER_GROUP: &str = "customer";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
}

/// Identity attached to every request by the session middleware.
#[derive(Debug, Clone, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    Authenticated(SessionUser),
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub groups: Vec<String>,
}

impl SessionUser {
    pub fn in_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g == name)
    }

    pub fn is_admin(&self) -> bool {
        self.in_group(ADMIN_GROUP)
    }

    /// Page a user lands on after signing in.
    pub fn landing_path(&self) -> &'static str {
        if self.is_admin() {
            "/"
        } else {
            "/user/"
        }
    }
}

impl Viewer {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(user) => Some(user),
        }
    }

    pub fn groups(&self) -> &[String] {
        match self {
            Viewer::Anonymous => &[],
            Viewer::Authenticated(user) => &user.groups,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Indoor")]
    Indoor,
    #[serde(rename = "Out Door")]
    OutDoor,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Indoor => "Indoor",
            Category::OutDoor => "Out Door",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Indoor" => Ok(Category::Indoor),
            "Out Door" => Ok(Category::OutDoor),
            other => Err(format!("unknown product category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub date_created: DateTime<Utc>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Out for delivery")]
    OutForDelivery,
    #[serde(rename = "Delivered")]
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::OutForDelivery => "Out for delivery",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{}'", s))
    }
}

/// An order joined with the names needed to display it.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub status: Option<OrderStatus>,
    pub note: Option<String>,
    pub date_created: DateTime<Utc>,
}

/// One validated row of an order formset.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub product_id: i64,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderChanges {
    pub customer_id: i64,
    pub product_id: i64,
    pub status: OrderStatus,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parses_display_labels() {
        assert_eq!("Out for delivery".parse::<OrderStatus>(), Ok(OrderStatus::OutForDelivery));
        assert_eq!("Delivered".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert!("delivered".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_category_round_trips_through_label() {
        assert_eq!("Out Door".parse::<Category>(), Ok(Category::OutDoor));
        assert_eq!(Category::Indoor.as_str(), "Indoor");
    }

    #[test]
    fn test_landing_path_depends_on_admin_group() {
        let mut user = SessionUser {
            id: 1,
            username: "dennis".to_string(),
            groups: vec![CUSTOMER_GROUP.to_string()],
        };
        assert_eq!(user.landing_path(), "/user/");

        user.groups.push(ADMIN_GROUP.to_string());
        assert_eq!(user.landing_path(), "/");
    }

    #[test]
    fn test_anonymous_viewer_has_no_groups() {
        let viewer = Viewer::Anonymous;
        assert!(viewer.user().is_none());
        assert!(viewer.groups().is_empty());
    }
}
