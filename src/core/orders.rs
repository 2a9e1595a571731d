//! Order forms: the multi-row creation formset and the single-order edit form.

use crate::core::forms::{FormErrors, Submission, INVALID_CHOICE, REQUIRED};
use crate::domain::model::{Customer, Order, OrderChanges, OrderDraft, OrderStatus, Product};
use crate::domain::ports::Store;
use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Blank rows offered on the creation page.
pub const EXTRA_ROWS: usize = 10;
/// Upper bound on rows accepted from a submission.
pub const MAX_ROWS: usize = 1000;
pub const MAX_NOTE_LEN: usize = 1000;

#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct OrderRow {
    pub product: String,
    pub status: String,
    pub product_errors: Vec<String>,
    pub status_errors: Vec<String>,
}

impl OrderRow {
    fn is_blank(&self) -> bool {
        self.product.trim().is_empty() && self.status.trim().is_empty()
    }

    fn has_errors(&self) -> bool {
        !self.product_errors.is_empty() || !self.status_errors.is_empty()
    }

    fn clean(&mut self, products: &[Product]) -> Option<OrderDraft> {
        let product = self.product.trim();
        let product_id = if product.is_empty() {
            self.product_errors.push(REQUIRED.to_string());
            None
        } else {
            match product.parse::<i64>() {
                Ok(id) if products.iter().any(|p| p.id == id) => Some(id),
                _ => {
                    self.product_errors.push(INVALID_CHOICE.to_string());
                    None
                }
            }
        };

        let status = self.status.trim();
        let status = if status.is_empty() {
            self.status_errors.push(REQUIRED.to_string());
            None
        } else {
            match status.parse::<OrderStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    self.status_errors.push(INVALID_CHOICE.to_string());
                    None
                }
            }
        };

        Some(OrderDraft {
            product_id: product_id?,
            status: status?,
        })
    }
}

#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct OrderFormset {
    pub rows: Vec<OrderRow>,
}

impl OrderFormset {
    pub fn blank() -> Self {
        Self {
            rows: vec![OrderRow::default(); EXTRA_ROWS],
        }
    }

    /// Reads `form-<n>-product` / `form-<n>-status` pairs from a urlencoded body.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut rows: Vec<OrderRow> = Vec::new();

        for (key, value) in pairs {
            let Some(rest) = key.strip_prefix("form-") else {
                continue;
            };
            let Some((index, field)) = rest.split_once('-') else {
                continue;
            };
            let Ok(index) = index.parse::<usize>() else {
                continue;
            };
            if index >= MAX_ROWS {
                continue;
            }
            if rows.len() <= index {
                rows.resize(index + 1, OrderRow::default());
            }
            match field {
                "product" => rows[index].product = value.clone(),
                "status" => rows[index].status = value.clone(),
                _ => {}
            }
        }

        Self { rows }
    }

    /// Blank rows are skipped; any error rejects the whole set.
    pub fn clean(mut self, products: &[Product]) -> Submission<Vec<OrderDraft>, OrderFormset> {
        let mut drafts = Vec::new();
        for row in self.rows.iter_mut().filter(|row| !row.is_blank()) {
            if let Some(draft) = row.clean(products) {
                drafts.push(draft);
            }
        }

        if self.rows.iter().any(OrderRow::has_errors) {
            Submission::Rejected(self)
        } else {
            Submission::Accepted(drafts)
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub note: String,
}

impl OrderForm {
    pub fn from_order(order: &Order) -> Self {
        Self {
            customer: order.customer_id.map(|id| id.to_string()).unwrap_or_default(),
            product: order.product_id.map(|id| id.to_string()).unwrap_or_default(),
            status: order.status.map(|s| s.as_str().to_string()).unwrap_or_default(),
            note: order.note.clone().unwrap_or_default(),
        }
    }

    pub fn clean(&self, customers: &[Customer], products: &[Product]) -> Submission<OrderChanges> {
        let mut errors = FormErrors::default();

        let customer_id = choice(&self.customer, "customer", &mut errors, |id| {
            customers.iter().any(|c| c.id == id)
        });
        let product_id = choice(&self.product, "product", &mut errors, |id| {
            products.iter().any(|p| p.id == id)
        });

        let status = match self.status.trim() {
            "" => {
                errors.add("status", REQUIRED);
                None
            }
            raw => match raw.parse::<OrderStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    errors.add("status", INVALID_CHOICE);
                    None
                }
            },
        };

        let note = self.note.trim();
        let note_len = note.chars().count();
        if note_len > MAX_NOTE_LEN {
            errors.add(
                "note",
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    MAX_NOTE_LEN, note_len
                ),
            );
        }

        match (customer_id, product_id, status) {
            (Some(customer_id), Some(product_id), Some(status)) if errors.is_empty() => {
                Submission::Accepted(OrderChanges {
                    customer_id,
                    product_id,
                    status,
                    note: (!note.is_empty()).then(|| note.to_string()),
                })
            }
            _ => Submission::Rejected(errors),
        }
    }
}

fn choice(
    raw: &str,
    field: &str,
    errors: &mut FormErrors,
    exists: impl Fn(i64) -> bool,
) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) if exists(id) => Some(id),
        _ => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

pub async fn require_customer(store: &dyn Store, id: i64) -> Result<Customer> {
    store
        .get_customer(id)
        .await?
        .ok_or_else(|| AppError::not_found("Customer", id))
}

pub async fn require_order(store: &dyn Store, id: i64) -> Result<Order> {
    store
        .get_order(id)
        .await?
        .ok_or_else(|| AppError::not_found("Order", id))
}

/// Validates the formset and inserts every filled row for `customer_id`.
pub async fn create_orders(
    store: &dyn Store,
    customer_id: i64,
    formset: OrderFormset,
) -> Result<Submission<Vec<i64>, OrderFormset>> {
    let products = store.list_products().await?;
    match formset.clean(&products) {
        Submission::Accepted(drafts) => {
            let ids = store.create_orders(customer_id, &drafts).await?;
            Ok(Submission::Accepted(ids))
        }
        Submission::Rejected(formset) => Ok(Submission::Rejected(formset)),
    }
}

pub async fn update_order(
    store: &dyn Store,
    order_id: i64,
    form: &OrderForm,
) -> Result<Submission<OrderChanges>> {
    let customers = store.list_customers().await?;
    let products = store.list_products().await?;
    match form.clean(&customers, &products) {
        Submission::Accepted(changes) => {
            store.update_order(order_id, &changes).await?;
            tracing::info!("Updated order {} to {}", order_id, changes.status);
            Ok(Submission::Accepted(changes))
        }
        rejected => Ok(rejected),
    }
}
