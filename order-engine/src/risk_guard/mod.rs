use crate::models::Order;
use log::warn;
use oms_api::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod ledger;
pub mod max_order_size;
pub mod max_position;

pub use ledger::{PositionChange, PositionLedger};
pub use max_order_size::MaxOrderSizePolicy;
pub use max_position::MaxPositionPolicy;

fn default_max_order_size() -> u64 {
    1000
}

fn default_max_position() -> u64 {
    2000
}

/// Pre-trade limits enforced by the standard policy chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Largest admissible quantity for a single order.
    #[serde(default = "default_max_order_size")]
    pub max_order_size: u64,
    /// Largest admissible absolute net position per symbol.
    #[serde(default = "default_max_position")]
    pub max_position: u64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_order_size: default_max_order_size(),
            max_position: default_max_position(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum RiskDecision {
    Approved,
    Rejected(String),
}

/// Context passed to policies to make decisions. `current_position` is the
/// ledger's view of the order's symbol at check time.
pub struct RiskContext<'a> {
    pub current_position: i64,
    pub limits: &'a RiskLimits,
}

pub trait Policy: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, order: &Order, ctx: &RiskContext) -> RiskDecision;
}

/// Policy chain plus the position ledger it reads from.
///
/// `check_order` is pure with respect to the ledger: calling it any number
/// of times changes nothing about what it will answer next. Positions move
/// only through `record_fill`.
pub struct RiskGuard {
    policies: Vec<Box<dyn Policy>>,
    ledger: PositionLedger,
    limits: RiskLimits,
}

impl RiskGuard {
    /// Guard with the standard chain: order size first, then projected
    /// position. First failure wins.
    pub fn new(limits: RiskLimits) -> Self {
        let mut guard = Self {
            policies: Vec::new(),
            ledger: PositionLedger::new(),
            limits,
        };
        guard.add_policy(Box::new(MaxOrderSizePolicy));
        guard.add_policy(Box::new(MaxPositionPolicy));
        guard
    }

    pub fn add_policy(&mut self, policy: Box<dyn Policy>) {
        self.policies.push(policy);
    }

    pub fn check_order(&self, order: &Order) -> RiskDecision {
        let ctx = RiskContext {
            current_position: self.ledger.position(order.symbol()),
            limits: &self.limits,
        };
        for policy in &self.policies {
            match policy.check(order, &ctx) {
                RiskDecision::Rejected(reason) => {
                    warn!(
                        "order {} rejected by policy {}: {}",
                        order.id(),
                        policy.name(),
                        reason
                    );
                    return RiskDecision::Rejected(format!("{}: {}", policy.name(), reason));
                }
                RiskDecision::Approved => continue,
            }
        }
        RiskDecision::Approved
    }

    /// Forwarded to the ledger, which is the sole writer of positions.
    pub fn record_fill(&mut self, order: &Order) -> Option<PositionChange> {
        self.ledger.record_fill(order)
    }

    pub fn position(&self, symbol: &Symbol) -> i64 {
        self.ledger.position(symbol)
    }

    pub fn positions(&self) -> BTreeMap<Symbol, i64> {
        self.ledger.snapshot()
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oms_api::{OrderId, OrderRequest, OrderType, Side};

    fn order(side: Side, quantity: u64) -> Order {
        Order::new(
            OrderId::new(1),
            &OrderRequest::new("AAPL", side, quantity, 100.0, OrderType::Limit),
        )
    }

    #[test]
    fn first_failing_policy_wins() {
        // 1500 breaks both limits; the size policy sits first in the chain.
        let guard = RiskGuard::new(RiskLimits {
            max_order_size: 1000,
            max_position: 1000,
        });
        match guard.check_order(&order(Side::Buy, 1500)) {
            RiskDecision::Rejected(reason) => {
                assert!(reason.starts_with("max_order_size:"), "{reason}")
            }
            RiskDecision::Approved => panic!("expected rejection"),
        }
    }

    #[test]
    fn check_is_repeatable() {
        let guard = RiskGuard::new(RiskLimits::default());
        let order = order(Side::Buy, 900);
        for _ in 0..5 {
            assert_eq!(guard.check_order(&order), RiskDecision::Approved);
        }
        assert_eq!(guard.position(&Symbol::new("AAPL")), 0);
    }

    #[test]
    fn custom_policy_joins_the_chain() {
        struct RejectAll;
        impl Policy for RejectAll {
            fn name(&self) -> &str {
                "reject_all"
            }
            fn check(&self, _: &Order, _: &RiskContext) -> RiskDecision {
                RiskDecision::Rejected("no trading today".into())
            }
        }

        let mut guard = RiskGuard::new(RiskLimits::default());
        guard.add_policy(Box::new(RejectAll));
        match guard.check_order(&order(Side::Buy, 1)) {
            RiskDecision::Rejected(reason) => assert_eq!(reason, "reject_all: no trading today"),
            RiskDecision::Approved => panic!("expected rejection"),
        }
    }
}
