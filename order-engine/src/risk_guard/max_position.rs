use super::{Policy, RiskContext, RiskDecision};
use crate::models::Order;

/// Caps the absolute net position an order would project.
///
/// Projection adds the signed order quantity to the ledger's current
/// position; quantity still resting in the book is not counted. The engine's
/// post-fill invariant covers the gap that leaves.
pub struct MaxPositionPolicy;

impl Policy for MaxPositionPolicy {
    fn name(&self) -> &str {
        "max_position"
    }

    fn check(&self, order: &Order, ctx: &RiskContext) -> RiskDecision {
        let projected = ctx.current_position + order.side().sign() * order.quantity() as i64;
        if projected.unsigned_abs() > ctx.limits.max_position {
            return RiskDecision::Rejected(format!(
                "position would be {}, exceeds max {} (current: {})",
                projected, ctx.limits.max_position, ctx.current_position
            ));
        }
        RiskDecision::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk_guard::{RiskGuard, RiskLimits};
    use oms_api::{OrderId, OrderRequest, OrderState, OrderType, Side};

    fn order(id: u64, side: Side, quantity: u64) -> Order {
        Order::new(
            OrderId::new(id),
            &OrderRequest::new("AAPL", side, quantity, 100.0, OrderType::Limit),
        )
    }

    fn limits() -> RiskLimits {
        RiskLimits {
            max_order_size: 5000,
            max_position: 2000,
        }
    }

    #[test]
    fn projection_counts_current_position() {
        let mut guard = RiskGuard::new(limits());
        let mut filled = order(1, Side::Buy, 1900);
        filled.transition(OrderState::Acked).unwrap();
        filled.transition(OrderState::Filled).unwrap();
        guard.record_fill(&filled);

        match guard.check_order(&order(2, Side::Buy, 200)) {
            RiskDecision::Rejected(reason) => {
                assert!(reason.contains("would be 2100"), "{reason}");
                assert!(reason.contains("current: 1900"), "{reason}");
            }
            RiskDecision::Approved => panic!("expected rejection"),
        }
    }

    #[test]
    fn short_positions_count_absolute() {
        let guard = RiskGuard::new(limits());
        assert!(matches!(
            guard.check_order(&order(1, Side::Sell, 2100)),
            RiskDecision::Rejected(_)
        ));
        assert_eq!(
            guard.check_order(&order(2, Side::Sell, 2000)),
            RiskDecision::Approved
        );
    }
}
