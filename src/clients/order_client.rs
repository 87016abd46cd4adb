use tokio::sync::{mpsc, watch};
use tracing::{debug, instrument};
use crate::dashboard::{self, DashboardStats};
use crate::domain::{Order, OrderDraft, OrderOwner, OrderStatus};
use crate::lifecycle::{OrderError, StatusUpdate};
use crate::listing::OrderFilter;
use crate::messages::{OrderRequest, OrderSnapshot};
use crate::repository::Persisted;

/// Client for the order service.
///
/// Every mutation goes through the service's mailbox, so status edits,
/// placements and reloads are applied one at a time.
#[derive(Clone)]
pub struct OrderClient {
    sender: mpsc::Sender<OrderRequest>,
}

impl OrderClient {
    pub fn new(sender: mpsc::Sender<OrderRequest>) -> Self {
        Self { sender }
    }

    /// Asks the service to stop after the requests already queued.
    pub async fn shutdown(&self) -> Result<(), OrderError> {
        self.sender
            .send(OrderRequest::Shutdown)
            .await
            .map_err(|_| OrderError::ActorCommunicationError("Actor closed".to_string()))
    }

    /// Same-day statistics over the current collection, using the local calendar.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, OrderError> {
        debug!("Computing dashboard stats");
        let orders = self.list_orders().await?;
        Ok(DashboardStats::compute_today(&orders))
    }

    #[instrument(skip(self))]
    pub async fn recent_orders(&self, limit: usize) -> Result<Vec<Order>, OrderError> {
        let orders = self.list_orders().await?;
        Ok(dashboard::recent_orders(&orders, limit))
    }
}

client_method!(OrderClient => fn create_order(owner: OrderOwner, draft: OrderDraft) -> Persisted<Order> as OrderRequest::CreateOrder, Error = OrderError);
client_method!(OrderClient => fn update_status(id: String, status: OrderStatus) -> StatusUpdate as OrderRequest::UpdateStatus, Error = OrderError);
client_method!(OrderClient => fn get_order(id: String) -> Option<Order> as OrderRequest::GetOrder, Error = OrderError);
client_method!(OrderClient => fn list_orders() -> Vec<Order> as OrderRequest::ListOrders, Error = OrderError);
client_method!(OrderClient => fn search_orders(filter: OrderFilter) -> Vec<Order> as OrderRequest::SearchOrders, Error = OrderError);
client_method!(OrderClient => fn orders_for_user(user_id: String) -> Vec<Order> as OrderRequest::OrdersForUser, Error = OrderError);
client_method!(OrderClient => fn select_order(id: String) -> Order as OrderRequest::SelectOrder, Error = OrderError);
client_method!(OrderClient => fn selected_order() -> Option<Order> as OrderRequest::SelectedOrder, Error = OrderError);
client_method!(OrderClient => fn close_detail() -> () as OrderRequest::CloseDetail, Error = OrderError);
client_method!(OrderClient => fn reload() -> usize as OrderRequest::Reload, Error = OrderError);
client_method!(OrderClient => fn subscribe() -> watch::Receiver<OrderSnapshot> as OrderRequest::Subscribe, Error = OrderError);
