use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{error, info, instrument, warn};

use super::{LocalOrderRepository, OrderRepository, Persisted, RepositoryError};
use crate::backend::{BackendError, InsertedOrder, RemoteOrderRecord, RemoteOrderStore};
use crate::domain::{Order, OrderDraft, OrderOwner};

/// Writes new orders to the hosted backend first and caches them locally.
///
/// When the backend insert fails the order is stored locally only and the
/// result says so. Listing and full rewrites always go to the local slot.
#[derive(Clone)]
pub struct DualWriteOrderRepository {
    local: LocalOrderRepository,
    remote: Arc<dyn RemoteOrderStore>,
}

impl DualWriteOrderRepository {
    pub fn new(local: LocalOrderRepository, remote: Arc<dyn RemoteOrderStore>) -> Self {
        Self { local, remote }
    }
}

/// Delivery and contact details travel to the backend inside `metadata`.
fn remote_metadata(draft: &OrderDraft) -> Value {
    let mut meta = match &draft.metadata {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("extra".to_string(), other.clone());
            map
        }
    };
    meta.insert("deliveryMethod".to_string(), json!(draft.delivery_method));
    let optional = [
        ("paymentMethod", &draft.payment_method),
        ("notes", &draft.notes),
        ("deliveryAddress", &draft.delivery_address),
        ("customerName", &draft.customer_name),
        ("customerEmail", &draft.customer_email),
        ("phone", &draft.phone),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            meta.insert(key.to_string(), json!(value));
        }
    }
    Value::Object(meta)
}

#[async_trait]
impl OrderRepository for DualWriteOrderRepository {
    #[instrument(skip(self, draft), fields(user_id = %owner.user_id))]
    async fn create(&self, owner: &OrderOwner, draft: OrderDraft) -> Result<Persisted<Order>, RepositoryError> {
        let created_at = Utc::now();
        let record = RemoteOrderRecord {
            user_id: owner.user_id.clone(),
            email: owner.email.clone(),
            items: draft.items.clone(),
            total: draft.total,
            status: draft.status,
            metadata: remote_metadata(&draft),
            created_at,
        };

        let inserted = match self.remote.insert_order(&record).await {
            Ok(inserted) => inserted,
            // The backend took the row; only its echo could not be read.
            Err(BackendError::InvalidResponse(detail)) => {
                warn!(%detail, "Remote insert accepted but response unreadable, assigning a local id");
                InsertedOrder::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist order remotely, falling back to local storage");
                return self.local.create(owner, draft).await;
            }
        };

        let id = inserted.id.unwrap_or_else(|| self.local.next_id());
        let order = Order::from_draft(
            id,
            owner.user_id.clone(),
            owner.email.clone(),
            inserted.created_at.unwrap_or(created_at),
            draft,
        );
        if let Err(e) = self.local.append(order.clone()).await {
            error!(order_id = %order.id, error = %e, "Order stored remotely but local cache write failed");
        }
        info!(order_id = %order.id, "Order stored remotely");
        Ok(Persisted::Remote(order))
    }

    async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        self.local.list().await
    }

    async fn save_all(&self, orders: &[Order]) -> Result<(), RepositoryError> {
        self.local.save_all(orders).await
    }
}
