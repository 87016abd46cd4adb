/// Custom actions for inventory records.
///
/// These actions represent stock movements beyond standard CRUD operations.
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryAction {
    /// Reads the current stock level without modifying it.
    CheckStock,
    /// Takes stock out of the pool when an order is placed.
    ///
    /// # Errors
    /// Fails if the requested amount exceeds the current stock.
    ReserveStock(u32),
    /// Returns previously reserved stock to the pool.
    ///
    /// No cap is applied, so stock may end above the daily limit.
    RevertStock(u32),
    /// Restocks up to the daily limit.
    ResetDaily,
}

/// Results from InventoryActions - variants match 1:1 with InventoryAction
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryActionResult {
    CheckStock(u32),
    ReserveStock { remaining: u32 },
    RevertStock { current: u32 },
    ResetDaily { current: u32 },
}
