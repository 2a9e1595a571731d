//! Order filter for the customer page.
//!
//! Built from query-string values. A value that fails to parse is reported
//! and ignored, so the remaining criteria still apply.

use crate::core::forms::{FormErrors, INVALID_CHOICE};
use crate::domain::model::{Order, OrderStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OrderFilterParams {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OrderFilter {
    pub product_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub note: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl OrderFilterParams {
    pub fn build(&self) -> (OrderFilter, FormErrors) {
        let mut filter = OrderFilter::default();
        let mut errors = FormErrors::default();

        let product = self.product.trim();
        if !product.is_empty() {
            match product.parse::<i64>() {
                Ok(id) => filter.product_id = Some(id),
                Err(_) => errors.add("product", INVALID_CHOICE),
            }
        }

        let status = self.status.trim();
        if !status.is_empty() {
            match status.parse::<OrderStatus>() {
                Ok(status) => filter.status = Some(status),
                Err(_) => errors.add("status", INVALID_CHOICE),
            }
        }

        let note = self.note.trim();
        if !note.is_empty() {
            filter.note = Some(note.to_lowercase());
        }

        filter.start_date = parse_date(&self.start_date, "start_date", &mut errors);
        filter.end_date = parse_date(&self.end_date, "end_date", &mut errors);

        (filter, errors)
    }
}

fn parse_date(raw: &str, field: &str, errors: &mut FormErrors) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "Enter a valid date.");
            None
        }
    }
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(product_id) = self.product_id {
            if order.product_id != Some(product_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if order.status != Some(status) {
                return false;
            }
        }
        if let Some(needle) = &self.note {
            let found = order
                .note
                .as_deref()
                .map(|note| note.to_lowercase().contains(needle))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }

        // Both bounds are whole days, inclusive.
        let day = order.date_created.date_naive();
        if self.start_date.is_some_and(|start| day < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| day > end) {
            return false;
        }

        true
    }

    pub fn apply(&self, orders: Vec<Order>) -> Vec<Order> {
        orders.into_iter().filter(|o| self.matches(o)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn order(id: i64, product_id: i64, status: OrderStatus, note: Option<&str>, day: u32) -> Order {
        Order {
            id,
            customer_id: Some(1),
            customer_name: None,
            product_id: Some(product_id),
            product_name: None,
            status: Some(status),
            note: note.map(str::to_string),
            date_created: Utc.with_ymd_and_hms(2024, 3, day, 15, 30, 0).unwrap(),
        }
    }

    fn sample() -> Vec<Order> {
        vec![
            order(1, 10, OrderStatus::Pending, Some("Ring the BELL"), 1),
            order(2, 10, OrderStatus::Delivered, None, 5),
            order(3, 20, OrderStatus::Delivered, Some("fragile"), 9),
        ]
    }

    fn ids(orders: &[Order]) -> Vec<i64> {
        orders.iter().map(|o| o.id).collect()
    }

    #[test]
    fn test_empty_params_keep_everything() {
        let (filter, errors) = OrderFilterParams::default().build();
        assert_eq!(filter, OrderFilter::default());
        assert!(errors.is_empty());
        assert_eq!(filter.apply(sample()).len(), 3);
    }

    #[test]
    fn test_status_and_product() {
        let params = OrderFilterParams {
            product: "10".to_string(),
            status: "Delivered".to_string(),
            ..Default::default()
        };
        let (filter, _) = params.build();
        assert_eq!(ids(&filter.apply(sample())), vec![2]);
    }

    #[test]
    fn test_note_is_case_insensitive_contains() {
        let params = OrderFilterParams {
            note: "bell".to_string(),
            ..Default::default()
        };
        let (filter, _) = params.build();
        assert_eq!(ids(&filter.apply(sample())), vec![1]);
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let params = OrderFilterParams {
            start_date: "2024-03-05".to_string(),
            end_date: "2024-03-09".to_string(),
            ..Default::default()
        };
        let (filter, _) = params.build();
        assert_eq!(ids(&filter.apply(sample())), vec![2, 3]);
    }

    #[test]
    fn test_invalid_values_are_reported_and_ignored() {
        let params = OrderFilterParams {
            status: "Lost".to_string(),
            start_date: "yesterday".to_string(),
            product: "20".to_string(),
            ..Default::default()
        };
        let (filter, errors) = params.build();
        assert!(errors.has("status"));
        assert!(errors.has("start_date"));
        assert_eq!(ids(&filter.apply(sample())), vec![3]);
    }
}
