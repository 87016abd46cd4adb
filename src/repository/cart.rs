use std::sync::Arc;

use super::{read_json, write_json, RepositoryError, SlotStore, CART_SLOT};
use crate::domain::LineItem;

/// The customer's cart, kept in its own slot.
#[derive(Clone)]
pub struct CartStore {
    slots: Arc<dyn SlotStore>,
}

impl CartStore {
    pub fn new(slots: Arc<dyn SlotStore>) -> Self {
        Self { slots }
    }

    pub async fn load(&self) -> Result<Vec<LineItem>, RepositoryError> {
        read_json(self.slots.as_ref(), CART_SLOT).await
    }

    pub async fn save(&self, items: &[LineItem]) -> Result<(), RepositoryError> {
        write_json(self.slots.as_ref(), CART_SLOT, items).await
    }

    pub async fn clear(&self) -> Result<(), RepositoryError> {
        self.slots.remove(CART_SLOT).await
    }
}
