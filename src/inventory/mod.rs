//! Inventory-specific resource logic, including stock reservation and reversion.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::actor_framework::ResourceActor;
use crate::clients::InventoryClient;
use crate::domain::InventoryRecord;

/// Creates a new inventory actor and its client.
///
/// Records are keyed by product id, so the generator is never consulted for
/// well-formed creates.
pub fn new(buffer_size: usize) -> (ResourceActor<InventoryRecord>, InventoryClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, String::new);
    (actor, InventoryClient::new(generic_client))
}
