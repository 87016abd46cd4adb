use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use crate::domain::{Order, OrderDraft, OrderOwner, OrderStatus};
use crate::lifecycle::{OrderError, StatusUpdate};
use crate::listing::OrderFilter;
use crate::repository::Persisted;

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Snapshot of the full order collection, newest first.
pub type OrderSnapshot = Arc<Vec<Order>>;

/// Typed messages for the order service. Each variant carries its
/// parameters and a oneshot channel for the response.
#[derive(Debug)]
pub enum OrderRequest {
    CreateOrder {
        owner: OrderOwner,
        draft: OrderDraft,
        respond_to: ServiceResponse<Persisted<Order>, OrderError>,
    },
    UpdateStatus {
        id: String,
        status: OrderStatus,
        respond_to: ServiceResponse<StatusUpdate, OrderError>,
    },
    GetOrder {
        id: String,
        respond_to: ServiceResponse<Option<Order>, OrderError>,
    },
    ListOrders {
        respond_to: ServiceResponse<Vec<Order>, OrderError>,
    },
    SearchOrders {
        filter: OrderFilter,
        respond_to: ServiceResponse<Vec<Order>, OrderError>,
    },
    OrdersForUser {
        user_id: String,
        respond_to: ServiceResponse<Vec<Order>, OrderError>,
    },
    SelectOrder {
        id: String,
        respond_to: ServiceResponse<Order, OrderError>,
    },
    SelectedOrder {
        respond_to: ServiceResponse<Option<Order>, OrderError>,
    },
    CloseDetail {
        respond_to: ServiceResponse<(), OrderError>,
    },
    Reload {
        respond_to: ServiceResponse<usize, OrderError>,
    },
    Subscribe {
        respond_to: ServiceResponse<watch::Receiver<OrderSnapshot>, OrderError>,
    },
    Shutdown,
}
