use thiserror::Error;
use crate::domain::OrderStatus;
use crate::inventory::InventoryError;
use crate::repository::RepositoryError;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order {id} is {status} and can no longer change")]
    TerminalStatus { id: String, status: OrderStatus },
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Order persistence error: {0}")]
    Persistence(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<RepositoryError> for OrderError {
    fn from(e: RepositoryError) -> Self {
        OrderError::Persistence(e.to_string())
    }
}

impl From<InventoryError> for OrderError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::NotFound(id) => OrderError::InvalidProduct(id),
            InventoryError::InsufficientStock { product_id, detail } => {
                OrderError::InsufficientStock(format!("{}: {}", product_id, detail))
            }
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
