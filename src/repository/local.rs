use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use super::{read_json, write_json, LocalIdGenerator, OrderRepository, Persisted, RepositoryError, SlotStore, ORDERS_SLOT};
use crate::domain::{Order, OrderDraft, OrderOwner};

/// Keeps the whole order collection in one slot.
///
/// Every write reads the collection, changes it and writes it back whole.
#[derive(Clone)]
pub struct LocalOrderRepository {
    slots: Arc<dyn SlotStore>,
    ids: Arc<LocalIdGenerator>,
}

impl LocalOrderRepository {
    pub fn new(slots: Arc<dyn SlotStore>) -> Self {
        Self {
            slots,
            ids: Arc::new(LocalIdGenerator::default()),
        }
    }

    /// Appends an already-built order to the slot.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn append(&self, order: Order) -> Result<Order, RepositoryError> {
        let mut orders = self.list().await?;
        orders.push(order.clone());
        self.save_all(&orders).await?;
        Ok(order)
    }

    pub fn next_id(&self) -> String {
        self.ids.next_id(Utc::now().timestamp_millis())
    }
}

#[async_trait]
impl OrderRepository for LocalOrderRepository {
    async fn create(&self, owner: &OrderOwner, draft: OrderDraft) -> Result<Persisted<Order>, RepositoryError> {
        let order = Order::from_draft(self.next_id(), owner.user_id.clone(), owner.email.clone(), Utc::now(), draft);
        let order = self.append(order).await?;
        info!(order_id = %order.id, "Order stored locally");
        Ok(Persisted::LocalOnly(order))
    }

    async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        read_json(self.slots.as_ref(), ORDERS_SLOT).await
    }

    async fn save_all(&self, orders: &[Order]) -> Result<(), RepositoryError> {
        write_json(self.slots.as_ref(), ORDERS_SLOT, orders).await
    }
}
