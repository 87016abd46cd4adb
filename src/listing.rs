//! Search and status filtering for the order list view.

use std::str::FromStr;

use crate::domain::{Order, OrderStatus};

/// Status dropdown of the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn accepts(&self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

/// Search term plus status filter.
///
/// The term matches an order id case-insensitively, or a phone number as a
/// literal substring. An empty term matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub search_term: String,
    pub status: StatusFilter,
}

impl OrderFilter {
    pub fn new(search_term: impl Into<String>, status: StatusFilter) -> Self {
        Self { search_term: search_term.into(), status }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.matches_term(order) && self.status.accepts(order.status)
    }

    fn matches_term(&self, order: &Order) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let term = self.search_term.to_lowercase();
        order.id.to_lowercase().contains(&term)
            || order
                .phone
                .as_deref()
                .is_some_and(|phone| phone.contains(self.search_term.as_str()))
    }

    /// Matching orders, in the order given.
    pub fn apply(&self, orders: &[Order]) -> Vec<Order> {
        orders.iter().filter(|order| self.matches(order)).cloned().collect()
    }
}

/// Newest first. Stable, so orders created at the same instant keep their
/// relative order.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use crate::domain::OrderDraft;

    fn order(id: &str, phone: Option<&str>, status: OrderStatus, minutes: i64) -> Order {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes);
        let mut order = Order::from_draft(id, "u", None, created, OrderDraft::default());
        order.phone = phone.map(str::to_string);
        order.status = status;
        order
    }

    fn sample() -> Vec<Order> {
        vec![
            order("ORD-A1", Some("09171234567"), OrderStatus::Pending, 0),
            order("ord-b2", Some("09281112222"), OrderStatus::Ready, 5),
            order("1714555800000", None, OrderStatus::Pending, 10),
        ]
    }

    #[test]
    fn test_all_with_empty_term_keeps_everything_in_order() {
        let orders = sample();
        assert_eq!(OrderFilter::default().apply(&orders), orders);
    }

    #[test]
    fn test_id_match_ignores_case() {
        let hits = OrderFilter::new("ord-a", StatusFilter::All).apply(&sample());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "ORD-A1");

        let hits = OrderFilter::new("B2", StatusFilter::All).apply(&sample());
        assert_eq!(hits[0].id, "ord-b2");
    }

    #[test]
    fn test_phone_substring_is_literal() {
        let orders = sample();
        let hits = OrderFilter::new("1112", StatusFilter::All).apply(&orders);
        let expected: Vec<Order> = orders
            .iter()
            .filter(|o| o.phone.as_deref().is_some_and(|p| p.contains("1112")))
            .cloned()
            .collect();
        assert_eq!(hits, expected);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_status_filter_combines_with_term() {
        let orders = sample();
        let pending = OrderFilter::new("", StatusFilter::Only(OrderStatus::Pending)).apply(&orders);
        assert_eq!(pending.len(), 2);

        let none = OrderFilter::new("ord-b2", StatusFilter::Only(OrderStatus::Pending)).apply(&orders);
        assert!(none.is_empty());

        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!("ready".parse::<StatusFilter>(), Ok(StatusFilter::Only(OrderStatus::Ready)));
    }

    #[test]
    fn test_sort_newest_first() {
        let mut orders = sample();
        sort_newest_first(&mut orders);
        let ids: Vec<&str> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1714555800000", "ord-b2", "ORD-A1"]);
    }
}
