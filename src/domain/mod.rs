pub mod user;
pub mod inventory;
pub mod order;

pub use user::*;
pub use inventory::*;
pub use order::*;
