//! Order lifecycle: the status transition table and the order service that
//! owns the order collection.

mod transitions;
pub mod error;
pub mod service;

pub use transitions::*;
pub use error::*;
pub use service::*;
