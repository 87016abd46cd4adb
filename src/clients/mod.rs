//! Client handles for the inventory actor and the order service.

#[macro_use]
mod macros;

mod inventory_client;
mod order_client;

pub use inventory_client::InventoryClient;
pub use order_client::OrderClient;
