use thiserror::Error;
use crate::backend::BackendError;
use crate::lifecycle::OrderError;
use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Login failed: no session returned")]
    LoginFailed,
    #[error("Auth error: {0}")]
    Auth(#[from] BackendError),
    #[error("Order error: {0}")]
    Order(#[from] OrderError),
    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
}
