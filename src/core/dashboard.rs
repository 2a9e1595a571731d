use crate::domain::model::{Order, OrderStatus};
use serde::Serialize;

/// How many orders the dashboard lists.
pub const RECENT_ORDERS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub out_for_delivery: usize,
    pub delivered: usize,
}

impl StatusCounts {
    pub fn tally(orders: &[Order]) -> Self {
        orders.iter().fold(Self::default(), |mut counts, order| {
            counts.total += 1;
            match order.status {
                Some(OrderStatus::Pending) => counts.pending += 1,
                Some(OrderStatus::OutForDelivery) => counts.out_for_delivery += 1,
                Some(OrderStatus::Delivered) => counts.delivered += 1,
                None => {}
            }
            counts
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_orders: usize,
    pub total_customers: usize,
    pub delivered: usize,
    pub pending: usize,
}

impl DashboardSummary {
    pub fn compute(orders: &[Order], total_customers: usize) -> Self {
        let counts = StatusCounts::tally(orders);
        Self {
            total_orders: counts.total,
            total_customers,
            delivered: counts.delivered,
            pending: counts.pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(id: i64, status: Option<OrderStatus>) -> Order {
        Order {
            id,
            customer_id: Some(1),
            customer_name: None,
            product_id: Some(1),
            product_name: None,
            status,
            note: None,
            date_created: Utc::now(),
        }
    }

    #[test]
    fn test_summary_counts_statuses() {
        let orders = vec![
            order(1, Some(OrderStatus::Pending)),
            order(2, Some(OrderStatus::Delivered)),
            order(3, Some(OrderStatus::Delivered)),
            order(4, Some(OrderStatus::OutForDelivery)),
            order(5, None),
        ];

        let summary = DashboardSummary::compute(&orders, 3);
        assert_eq!(summary.total_orders, 5);
        assert_eq!(summary.total_customers, 3);
        assert_eq!(summary.delivered, 2);
        assert_eq!(summary.pending, 1);

        assert_eq!(StatusCounts::tally(&orders).out_for_delivery, 1);
    }

    #[test]
    fn test_empty_summary() {
        let summary = DashboardSummary::compute(&[], 0);
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.pending, 0);
    }
}
