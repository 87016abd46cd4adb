use serde::{Deserialize, Serialize};

/// Stock tracking for one product.
///
/// # Actor Framework
/// Managed by a [`ResourceActor`](crate::actor_framework::ResourceActor); see
/// [`crate::inventory`] for the stock actions it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub product_id: String,
    pub name: String,
    pub current_stock: u32,
    pub daily_limit: u32,
}

impl InventoryRecord {
    /// Creates a record stocked up to its daily limit.
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, daily_limit: u32) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            current_stock: daily_limit,
            daily_limit,
        }
    }

    pub fn is_low(&self, threshold: u32) -> bool {
        self.current_stock <= threshold
    }
}

/// Payload for registering a product with the inventory.
#[derive(Debug, Clone)]
pub struct InventoryCreate {
    pub product_id: String,
    pub name: String,
    pub daily_limit: u32,
    /// Starting stock; defaults to the daily limit.
    pub current_stock: Option<u32>,
}

impl From<InventoryRecord> for InventoryCreate {
    fn from(record: InventoryRecord) -> Self {
        Self {
            product_id: record.product_id,
            name: record.name,
            daily_limit: record.daily_limit,
            current_stock: Some(record.current_stock),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InventoryPatch {
    pub name: Option<String>,
    pub daily_limit: Option<u32>,
    pub current_stock: Option<u32>,
}
