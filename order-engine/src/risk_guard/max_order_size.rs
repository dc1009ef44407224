use super::{Policy, RiskContext, RiskDecision};
use crate::models::Order;

/// Caps the quantity of any single order.
pub struct MaxOrderSizePolicy;

impl Policy for MaxOrderSizePolicy {
    fn name(&self) -> &str {
        "max_order_size"
    }

    fn check(&self, order: &Order, ctx: &RiskContext) -> RiskDecision {
        if order.quantity() > ctx.limits.max_order_size {
            return RiskDecision::Rejected(format!(
                "order size {} exceeds max {}",
                order.quantity(),
                ctx.limits.max_order_size
            ));
        }
        RiskDecision::Approved
    }
}
