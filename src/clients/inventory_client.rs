use tracing::{debug, instrument, warn};
use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::domain::{InventoryCreate, InventoryPatch, InventoryRecord};
use crate::inventory::{InventoryAction, InventoryActionResult, InventoryError};

/// Client for interacting with the inventory actor.
#[derive(Clone)]
pub struct InventoryClient {
    inner: ResourceClient<InventoryRecord>,
}

impl_basic_client!(InventoryClient, InventoryRecord, InventoryError, record);

fn unexpected(result: InventoryActionResult) -> InventoryError {
    InventoryError::ActorCommunicationError(format!("Unexpected result: {:?}", result))
}

impl InventoryClient {
    #[instrument(skip(self, record), fields(product_id = %record.product_id))]
    pub async fn create_record(&self, record: InventoryCreate) -> Result<String, InventoryError> {
        debug!("Sending request");
        self.inner.create(record).await.map_err(InventoryError::from)
    }

    #[instrument(skip(self))]
    pub async fn update_record(&self, id: String, patch: InventoryPatch) -> Result<InventoryRecord, InventoryError> {
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(InventoryError::from)
    }

    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: String) -> Result<u32, InventoryError> {
        debug!("Sending request");
        match self.inner.perform_action(id, InventoryAction::CheckStock).await? {
            InventoryActionResult::CheckStock(level) => Ok(level),
            other => Err(unexpected(other)),
        }
    }

    /// Takes `quantity` out of the product's stock. Returns what is left.
    #[instrument(skip(self))]
    pub async fn reserve_stock(&self, id: String, quantity: u32) -> Result<u32, InventoryError> {
        debug!("Sending request");
        match self.inner.perform_action(id.clone(), InventoryAction::ReserveStock(quantity)).await {
            Ok(InventoryActionResult::ReserveStock { remaining }) => Ok(remaining),
            Ok(other) => Err(unexpected(other)),
            Err(FrameworkError::Rejected(detail)) => {
                warn!(%detail, "Stock reservation rejected");
                Err(InventoryError::InsufficientStock { product_id: id, detail })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `quantity` to the product's stock. Returns the new level.
    #[instrument(skip(self))]
    pub async fn revert_stock(&self, id: String, quantity: u32) -> Result<u32, InventoryError> {
        debug!("Sending request");
        match self.inner.perform_action(id, InventoryAction::RevertStock(quantity)).await? {
            InventoryActionResult::RevertStock { current } => Ok(current),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn reset_daily(&self, id: String) -> Result<u32, InventoryError> {
        debug!("Sending request");
        match self.inner.perform_action(id, InventoryAction::ResetDaily).await? {
            InventoryActionResult::ResetDaily { current } => Ok(current),
            other => Err(unexpected(other)),
        }
    }

    /// Products at or below `threshold`, ordered by product id.
    #[instrument(skip(self))]
    pub async fn low_stock_products(&self, threshold: u32) -> Result<Vec<InventoryRecord>, InventoryError> {
        let records = self.list_records().await?;
        Ok(crate::dashboard::low_stock(&records, threshold))
    }
}
