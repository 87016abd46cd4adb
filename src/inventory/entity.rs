use crate::actor_framework::Entity;
use crate::domain::{InventoryCreate, InventoryPatch, InventoryRecord};
use super::actions::{InventoryAction, InventoryActionResult};

impl Entity for InventoryRecord {
    type Id = String;
    type CreateParams = InventoryCreate;
    type Patch = InventoryPatch;
    type Action = InventoryAction;
    type ActionResult = InventoryActionResult;

    fn id(&self) -> &String { &self.product_id }

    /// Inventory is keyed by product id rather than a generated one.
    fn assigned_id(params: &InventoryCreate) -> Option<String> {
        Some(params.product_id.clone())
    }

    /// Creates a new record from creation parameters.
    ///
    /// # Arguments
    /// * `id` - The product id
    /// * `params` - Name, daily limit and optional starting stock
    fn from_create_params(id: String, params: InventoryCreate) -> Result<Self, String> {
        if id.is_empty() {
            return Err("Product id required".to_string());
        }
        Ok(Self {
            product_id: id,
            name: params.name,
            current_stock: params.current_stock.unwrap_or(params.daily_limit),
            daily_limit: params.daily_limit,
        })
    }

    fn on_update(&mut self, patch: InventoryPatch) -> Result<(), String> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(daily_limit) = patch.daily_limit {
            self.daily_limit = daily_limit;
        }
        if let Some(current_stock) = patch.current_stock {
            self.current_stock = current_stock;
        }
        Ok(())
    }

    /// Handles stock movements.
    ///
    /// # Errors
    /// Returns an error if attempting to reserve more stock than available.
    fn handle_action(&mut self, action: InventoryAction) -> Result<InventoryActionResult, String> {
        match action {
            InventoryAction::CheckStock => Ok(InventoryActionResult::CheckStock(self.current_stock)),
            InventoryAction::ReserveStock(amount) => {
                if self.current_stock >= amount {
                    self.current_stock -= amount;
                    Ok(InventoryActionResult::ReserveStock { remaining: self.current_stock })
                } else {
                    Err(format!("{} available, {} requested", self.current_stock, amount))
                }
            }
            InventoryAction::RevertStock(amount) => {
                self.current_stock = self.current_stock.saturating_add(amount);
                Ok(InventoryActionResult::RevertStock { current: self.current_stock })
            }
            InventoryAction::ResetDaily => {
                self.current_stock = self.daily_limit;
                Ok(InventoryActionResult::ResetDaily { current: self.current_stock })
            }
        }
    }
}
