use thiserror::Error;
use crate::actor_framework::FrameworkError;

/// Errors that can occur during inventory operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InventoryError {
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("Product already tracked: {0}")]
    AlreadyExists(String),
    #[error("Insufficient stock for {product_id}: {detail}")]
    InsufficientStock { product_id: String, detail: String },
    #[error("Inventory validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for InventoryError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => InventoryError::NotFound(id),
            FrameworkError::AlreadyExists(id) => InventoryError::AlreadyExists(id),
            FrameworkError::Rejected(msg) => InventoryError::ValidationError(msg),
            other => InventoryError::ActorCommunicationError(other.to_string()),
        }
    }
}
