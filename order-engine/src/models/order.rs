use crate::lifecycle::{self, IllegalTransition};
use oms_api::{OrderId, OrderRequest, OrderState, OrderType, Side, Symbol};
use serde::{Deserialize, Serialize};

/// A single order tracked through its lifecycle.
///
/// Owned by the engine and the book for as long as the order lives; the risk
/// guard only ever reads symbol, side and quantity. Timestamps are unix
/// millis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    client_id: Option<String>,
    symbol: Symbol,
    side: Side,
    order_type: OrderType,
    quantity: u64,
    price: f64,
    state: OrderState,
    created_ms: i64,
    updated_ms: i64,
}

impl Order {
    pub fn new(id: OrderId, request: &OrderRequest) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id,
            client_id: request.client_id.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            price: request.price,
            state: OrderState::New,
            created_ms: now,
            updated_ms: now,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn created_ms(&self) -> i64 {
        self.created_ms
    }

    pub fn updated_ms(&self) -> i64 {
        self.updated_ms
    }

    /// Moves the order to `to` if the lifecycle table allows it. On failure
    /// the state is left exactly as it was.
    pub fn transition(&mut self, to: OrderState) -> Result<OrderState, IllegalTransition> {
        let next = lifecycle::transition(self.state, to)?;
        self.state = next;
        self.touch();
        Ok(next)
    }

    pub(crate) fn set_quantity(&mut self, quantity: u64) {
        self.quantity = quantity;
        self.touch();
    }

    pub(crate) fn set_price(&mut self, price: f64) {
        self.price = price;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_ms = chrono::Utc::now().timestamp_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OrderRequest {
        OrderRequest::new("AAPL", Side::Buy, 100, 189.5, OrderType::Limit).with_client_id("C-1")
    }

    #[test]
    fn starts_new_with_request_fields() {
        let order = Order::new(OrderId::new(1), &request());
        assert_eq!(order.state(), OrderState::New);
        assert_eq!(order.symbol().as_str(), "AAPL");
        assert_eq!(order.side(), Side::Buy);
        assert_eq!(order.quantity(), 100);
        assert_eq!(order.client_id(), Some("C-1"));
        assert_eq!(order.created_ms(), order.updated_ms());
    }

    #[test]
    fn failed_transition_leaves_state_untouched() {
        let mut order = Order::new(OrderId::new(1), &request());
        assert!(order.transition(OrderState::Filled).is_err());
        assert_eq!(order.state(), OrderState::New);

        order.transition(OrderState::Acked).unwrap();
        assert!(order.transition(OrderState::Rejected).is_err());
        assert_eq!(order.state(), OrderState::Acked);
    }
}
