use super::ids::{OrderId, Symbol};
use super::order::{OrderState, Side};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything the core reports about its own behaviour.
///
/// One event per step: creation, each state-change attempt (including the
/// refused ones, with `success: false`), every risk verdict, every position
/// move, and any error that is not already covered by a failed state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OmsEvent {
    OrderCreated {
        id: OrderId,
        client_id: Option<String>,
        symbol: Symbol,
        side: Side,
        quantity: u64,
        price: f64,
    },
    StateChange {
        id: OrderId,
        from: OrderState,
        to: OrderState,
        success: bool,
    },
    RiskCheck {
        id: OrderId,
        symbol: Symbol,
        side: Side,
        quantity: u64,
        passed: bool,
        reason: Option<String>,
    },
    PositionUpdate {
        symbol: Symbol,
        old: i64,
        new: i64,
        delta: i64,
    },
    Error {
        detail: String,
        fatal: bool,
    },
}

impl OmsEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            OmsEvent::OrderCreated { .. } => "order_created",
            OmsEvent::StateChange { .. } => "state_change",
            OmsEvent::RiskCheck { .. } => "risk_check",
            OmsEvent::PositionUpdate { .. } => "position_update",
            OmsEvent::Error { .. } => "error",
        }
    }
}

/// One appended line of the audit stream.
///
/// `seq` is assigned by the sink and strictly increases in emission order;
/// `timestamp_ms` is wall-clock and may repeat under bursts, which is why the
/// sequence number, not the clock, carries the ordering guarantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub id: Uuid,
    pub timestamp_ms: i64,
    pub event: OmsEvent,
}

impl EventRecord {
    pub fn new(seq: u64, event: OmsEvent) -> Self {
        Self {
            seq,
            id: Uuid::new_v4(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        let event = OmsEvent::PositionUpdate {
            symbol: Symbol::new("AAPL"),
            old: 0,
            new: 100,
            delta: 100,
        };
        assert_eq!(event.kind(), "position_update");

        let event = OmsEvent::Error {
            detail: "boom".into(),
            fatal: false,
        };
        assert_eq!(event.kind(), "error");
    }

    #[test]
    fn record_keeps_assigned_sequence() {
        let record = EventRecord::new(
            7,
            OmsEvent::StateChange {
                id: OrderId::new(1),
                from: OrderState::New,
                to: OrderState::Acked,
                success: true,
            },
        );
        assert_eq!(record.seq, 7);
        assert!(record.timestamp_ms > 0);
    }
}
