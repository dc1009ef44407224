use crate::models::Order;
use log::warn;
use oms_api::{OrderState, Symbol};
use std::collections::{BTreeMap, HashMap};

/// Net position change produced by one fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionChange {
    pub symbol: Symbol,
    pub old: i64,
    pub new: i64,
    pub delta: i64,
}

/// Per-symbol signed net quantities.
///
/// The only writer is `record_fill`, and it only writes for orders that
/// actually reached `Filled`; anything else is a caller mistake that is
/// logged and skipped, never applied. Unseen symbols are flat.
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<Symbol, i64>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, symbol: &Symbol) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn record_fill(&mut self, order: &Order) -> Option<PositionChange> {
        if order.state() != OrderState::Filled {
            warn!(
                "ignoring position update for order {}: state is {}, not FILLED",
                order.id(),
                order.state()
            );
            return None;
        }
        let delta = order.side().sign() * order.quantity() as i64;
        let old = self.position(order.symbol());
        let new = old + delta;
        self.positions.insert(order.symbol().clone(), new);
        Some(PositionChange {
            symbol: order.symbol().clone(),
            old,
            new,
            delta,
        })
    }

    pub fn snapshot(&self) -> BTreeMap<Symbol, i64> {
        self.positions
            .iter()
            .map(|(symbol, quantity)| (symbol.clone(), *quantity))
            .collect()
    }
}
