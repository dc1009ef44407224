use crate::models::Order;
use oms_api::{OrderId, Side, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod indexed;
pub mod naive;

pub use indexed::IndexedBook;
pub use naive::NaiveBook;

pub const PRICE_SCALE: f64 = 10_000.0;

/// Price normalized to an integer tick grid of 1e-4.
///
/// The book orders and groups levels on this key, never on raw floats, so
/// two prices within half a tick land on the same level and `at_price`
/// queries need no epsilon comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceKey(i64);

impl PriceKey {
    pub fn from_price(price: f64) -> Self {
        Self((price * PRICE_SCALE).round() as i64)
    }

    pub fn to_price(self) -> f64 {
        self.0 as f64 / PRICE_SCALE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("duplicate order id {0}")]
    DuplicateId(OrderId),
    #[error("order {0} not found")]
    NotFound(OrderId),
    #[error("invalid quantity {0}")]
    InvalidQuantity(u64),
}

/// Price-time-priority index of resting orders.
///
/// One sorted sequence per (symbol, side): bids descending, asks ascending,
/// arrival order breaking ties. Every method leaves each side fully sorted
/// before returning; callers never observe a partially reordered state.
/// The two implementations must stay observably identical for any
/// interleaving of these operations.
pub trait Book: Send {
    /// Short name for logs and the run summary.
    fn name(&self) -> &'static str;

    /// Inserts at the position price-time priority dictates. The id must be
    /// new to the whole book.
    fn add(&mut self, order: Order) -> Result<(), BookError>;

    /// Updates quantity in place, keeping the time-priority slot. A price on
    /// a different tick moves the order to the tail of the new level,
    /// resetting its priority; that reset is deliberate, not a side effect.
    /// Zero quantity is refused.
    fn amend(
        &mut self,
        id: OrderId,
        new_quantity: u64,
        new_price: Option<f64>,
    ) -> Result<(), BookError>;

    /// Removes and returns the order. Removing an id twice is an error, not
    /// a silent success.
    fn remove(&mut self, id: OrderId) -> Result<Order, BookError>;

    /// Highest bid / lowest ask, earliest arrival at that price.
    fn best(&self, symbol: &Symbol, side: Side) -> Option<&Order>;

    /// Ids resting at the level `price` rounds to, in time priority.
    fn at_price(&self, symbol: &Symbol, side: Side, price: f64) -> Vec<OrderId>;

    /// The full side in priority order.
    fn orders(&self, symbol: &Symbol, side: Side) -> Vec<&Order>;

    fn get(&self, id: OrderId) -> Option<&Order>;

    /// Resting order count across all symbols.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which implementation to run. The naive book is the correctness baseline;
/// the indexed book is the real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BookKind {
    Naive,
    #[default]
    Indexed,
}

impl BookKind {
    pub fn build(self) -> Box<dyn Book> {
        match self {
            BookKind::Naive => Box::new(NaiveBook::new()),
            BookKind::Indexed => Box::new(IndexedBook::new()),
        }
    }
}

impl fmt::Display for BookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookKind::Naive => write!(f, "naive"),
            BookKind::Indexed => write!(f, "indexed"),
        }
    }
}

#[cfg(test)]
mod tests;
