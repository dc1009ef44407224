use super::ids::Symbol;
use super::order::{OrderType, Side};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a request cannot become an order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("order quantity must be positive")]
    ZeroQuantity,
    #[error("order price must be positive and finite, got {0}")]
    BadPrice(f64),
}

/// An instruction to create an order, as produced by the wire decoder or
/// built directly by an embedding application.
///
/// Quantity must be strictly positive and the price positive and finite;
/// `validate` enforces both, and the engine refuses to assign an identifier
/// until it passes. `client_id` is the caller's own reference (FIX ClOrdID)
/// and may later be used to address the order instead of the engine-assigned
/// id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: u64,
    pub price: f64,
    pub order_type: OrderType,
    pub client_id: Option<String>,
}

impl OrderRequest {
    pub fn new(
        symbol: impl Into<Symbol>,
        side: Side,
        quantity: u64,
        price: f64,
        order_type: OrderType,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            price,
            order_type,
            client_id: None,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Checks the numeric fields no order can exist without. An infinite
    /// price would otherwise saturate the book's tick grid and rest as an
    /// unbeatable best.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.quantity == 0 {
            return Err(RequestError::ZeroQuantity);
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(RequestError::BadPrice(self.price));
        }
        Ok(())
    }
}
