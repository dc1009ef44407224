//! Shared vocabulary for the order-management workspace: identifiers, order
//! enums, the construction request, and the event stream contract.
//!
//! Engine crates depend on this; reporting or strategy collaborators can too,
//! without pulling in the engine itself.

pub mod model;
pub mod traits;

pub use model::event::{EventRecord, OmsEvent};
pub use model::ids::{OrderId, Symbol};
pub use model::order::{OrderState, OrderType, Side};
pub use model::request::{OrderRequest, RequestError};
pub use traits::event_sink::EventSink;
