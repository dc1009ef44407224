use oms_api::{OrderId, OrderRequest, Symbol};
use serde::{Deserialize, Serialize};

/// Outcome carried by an execution report (FIX tag 39).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecStatus {
    Filled,
    Canceled,
}

/// Decoded inbound traffic, one variant per supported wire message.
///
/// Amend, cancel and execution reference their target by engine id when the
/// sender knows it, otherwise by the original client id. The symbol rides
/// along when present so the sharded front can route without a shared
/// id table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IngressMessage {
    NewOrder(OrderRequest),
    Amend {
        symbol: Option<Symbol>,
        order_id: Option<OrderId>,
        client_id: Option<String>,
        quantity: u64,
        price: Option<f64>,
    },
    Cancel {
        symbol: Option<Symbol>,
        order_id: Option<OrderId>,
        client_id: Option<String>,
    },
    Execution {
        symbol: Option<Symbol>,
        order_id: Option<OrderId>,
        client_id: Option<String>,
        status: ExecStatus,
    },
}

impl IngressMessage {
    /// Routing symbol, when the message carries one.
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            IngressMessage::NewOrder(request) => Some(&request.symbol),
            IngressMessage::Amend { symbol, .. }
            | IngressMessage::Cancel { symbol, .. }
            | IngressMessage::Execution { symbol, .. } => symbol.as_ref(),
        }
    }

    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            IngressMessage::NewOrder(_) => None,
            IngressMessage::Amend { order_id, .. }
            | IngressMessage::Cancel { order_id, .. }
            | IngressMessage::Execution { order_id, .. } => *order_id,
        }
    }
}
