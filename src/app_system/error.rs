use thiserror::Error;
use crate::inventory::InventoryError;
use crate::lifecycle::OrderError;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Order service error: {0}")]
    Order(#[from] OrderError),
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
    #[error("Service task failed: {0}")]
    TaskFailed(String),
}
