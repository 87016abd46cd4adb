//! Figures for the admin dashboard, derived from the order collection and
//! the inventory.

use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::watch;

use crate::domain::{InventoryRecord, Order};
use crate::listing::sort_newest_first;
use crate::messages::OrderSnapshot;

/// Summary shown at the top of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Orders created on the current calendar day.
    pub today_orders: usize,
    /// Sum of the totals of today's orders.
    pub today_revenue: f64,
    /// Distinct customers across all orders, not only today's.
    pub total_customers: usize,
    /// `today_revenue / today_orders`, or zero on a day without orders.
    pub avg_order_value: f64,
}

impl DashboardStats {
    /// Computes the stats for `today` as seen in `tz`.
    ///
    /// Cancelled orders still count towards today's figures.
    pub fn compute<Tz: TimeZone>(orders: &[Order], today: NaiveDate, tz: &Tz) -> Self {
        let todays: Vec<&Order> = orders.iter().filter(|order| order.created_on(tz) == today).collect();
        let today_revenue: f64 = todays.iter().map(|order| order.total).sum();
        let total_customers = orders
            .iter()
            .map(|order| order.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let avg_order_value = if todays.is_empty() {
            0.0
        } else {
            today_revenue / todays.len() as f64
        };

        Self {
            today_orders: todays.len(),
            today_revenue,
            total_customers,
            avg_order_value,
        }
    }

    /// Stats for the current day on the local clock.
    pub fn compute_today(orders: &[Order]) -> Self {
        let today = Local::now().date_naive();
        Self::compute(orders, today, &Local)
    }
}

/// The `limit` newest orders.
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<Order> {
    let mut sorted = orders.to_vec();
    sort_newest_first(&mut sorted);
    sorted.truncate(limit);
    sorted
}

/// Records whose current stock is at or below `threshold`, by product id.
pub fn low_stock(records: &[InventoryRecord], threshold: u32) -> Vec<InventoryRecord> {
    let mut low: Vec<InventoryRecord> = records.iter().filter(|r| r.is_low(threshold)).cloned().collect();
    low.sort_by(|a, b| a.product_id.cmp(&b.product_id));
    low
}

/// Recomputes the stats every time the order collection changes.
pub struct DashboardFeed<Tz: TimeZone = Local> {
    snapshots: watch::Receiver<OrderSnapshot>,
    tz: Tz,
}

impl DashboardFeed<Local> {
    pub fn new(snapshots: watch::Receiver<OrderSnapshot>) -> Self {
        Self::with_timezone(snapshots, Local)
    }
}

impl<Tz: TimeZone> DashboardFeed<Tz> {
    pub fn with_timezone(snapshots: watch::Receiver<OrderSnapshot>, tz: Tz) -> Self {
        Self { snapshots, tz }
    }

    fn stats_for(&self, orders: &[Order]) -> DashboardStats {
        let today = chrono::Utc::now().with_timezone(&self.tz).date_naive();
        DashboardStats::compute(orders, today, &self.tz)
    }

    /// Stats over the latest snapshot.
    pub fn current(&self) -> DashboardStats {
        let orders = self.snapshots.borrow().clone();
        self.stats_for(&orders)
    }

    /// Waits for the next change and returns the fresh stats. `None` once the
    /// order service has stopped.
    pub async fn next(&mut self) -> Option<DashboardStats> {
        self.snapshots.changed().await.ok()?;
        let orders = self.snapshots.borrow_and_update().clone();
        Some(self.stats_for(&orders))
    }
}
