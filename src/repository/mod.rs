//! Order persistence.
//!
//! The local slot store holds the whole order collection as one JSON blob.
//! [`DualWriteOrderRepository`] additionally mirrors new orders to the hosted
//! backend and reports which of the two actually took the write.

mod cart;
mod dual;
mod local;
mod slot;

pub use cart::*;
pub use dual::*;
pub use local::*;
pub use slot::*;

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;
use crate::domain::{Order, OrderDraft, OrderOwner};

/// Slot holding the order collection.
pub const ORDERS_SLOT: &str = "simple-dough-orders";
/// Slot holding the customer's cart.
pub const CART_SLOT: &str = "simple-dough-cart";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where a write ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Persisted<T> {
    /// Accepted by the hosted backend (and cached locally).
    Remote(T),
    /// Only the local slot has it; other devices will not see it.
    LocalOnly(T),
}

impl<T> Persisted<T> {
    pub fn is_remote(&self) -> bool {
        matches!(self, Persisted::Remote(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Persisted::Remote(value) | Persisted::LocalOnly(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Persisted::Remote(value) | Persisted::LocalOnly(value) => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Persisted<U> {
        match self {
            Persisted::Remote(value) => Persisted::Remote(f(value)),
            Persisted::LocalOnly(value) => Persisted::LocalOnly(f(value)),
        }
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Persists a new order and returns it with its assigned id.
    async fn create(&self, owner: &OrderOwner, draft: OrderDraft) -> Result<Persisted<Order>, RepositoryError>;

    /// The full collection in stored order.
    async fn list(&self) -> Result<Vec<Order>, RepositoryError>;

    /// Replaces the full collection.
    async fn save_all(&self, orders: &[Order]) -> Result<(), RepositoryError>;
}

/// Millisecond-timestamp ids, bumped when two orders land in the same
/// millisecond.
#[derive(Debug, Default)]
pub struct LocalIdGenerator {
    last: AtomicI64,
}

impl LocalIdGenerator {
    pub fn next_id(&self, now_millis: i64) -> String {
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now_millis.max(current + 1);
            match self.last.compare_exchange(current, candidate, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return candidate.to_string(),
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_stay_unique_within_a_millisecond() {
        let ids = LocalIdGenerator::default();
        assert_eq!(ids.next_id(1_000), "1000");
        assert_eq!(ids.next_id(1_000), "1001");
        assert_eq!(ids.next_id(999), "1002");
        assert_eq!(ids.next_id(5_000), "5000");
    }

    #[test]
    fn test_persisted_accessors() {
        let remote = Persisted::Remote(3);
        assert!(remote.is_remote());
        assert_eq!(*remote.get(), 3);
        let local = Persisted::LocalOnly("a").map(str::len);
        assert!(!local.is_remote());
        assert_eq!(local.into_inner(), 1);
    }
}
