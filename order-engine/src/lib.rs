//! Order-management core: lifecycle state machine, pre-trade risk guard,
//! price-time-priority order books (a naive baseline and an indexed
//! implementation), a FIX-subset decoder, and the engine that sequences them
//! behind an injected event sink.

pub mod book;
pub mod engine;
pub mod error;
pub mod events;
pub mod gateway;
pub mod io;
pub mod lifecycle;
pub mod models;
pub mod risk_guard;

pub use error::{OmsError, Result};
