use crate::book::{Book, BookError, PriceKey};
use crate::error::{OmsError, Result};
use crate::lifecycle::{self, IllegalTransition};
use crate::models::{ExecStatus, IngressMessage, Order};
use crate::risk_guard::{PositionChange, RiskDecision, RiskGuard, RiskLimits};
use log::{info, warn};
use oms_api::{EventSink, OmsEvent, OrderId, OrderRequest, OrderState, Side, Symbol};
use std::collections::{BTreeMap, HashMap};

pub mod sharded;

pub use sharded::{Quote, ShardReport, ShardedOms, SinkFactory};

/// Hands out order ids along an arithmetic stride so independent engine
/// instances never collide.
struct OrderIdGen {
    next: u64,
    stride: u64,
}

impl OrderIdGen {
    fn new(start: u64, stride: u64) -> Self {
        Self { next: start, stride }
    }

    fn next_id(&mut self) -> OrderId {
        let id = OrderId::new(self.next);
        self.next += self.stride;
        id
    }
}

/// Outcome of a submission. A risk rejection is an ordinary outcome, not an
/// error: the order exists, its rejection was recorded, and it ended
/// REJECTED.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Accepted(OrderId),
    Rejected { id: OrderId, reason: String },
}

/// What an applied ingress message did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Submitted(Submission),
    Amended(OrderId),
    Canceled(OrderId),
    Filled(OrderId),
}

/// Per-state tallies for the run summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StateCounts {
    pub acked: usize,
    pub filled: usize,
    pub canceled: usize,
    pub rejected: usize,
}

impl StateCounts {
    pub fn absorb(&mut self, other: StateCounts) {
        self.acked += other.acked;
        self.filled += other.filled;
        self.canceled += other.canceled;
        self.rejected += other.rejected;
    }
}

/// The per-shard core: one book, one risk guard, one event sink, and every
/// order this instance has ever seen. Terminal orders leave the book but
/// stay queryable in `closed`.
pub struct OrderManager {
    book: Box<dyn Book>,
    risk_guard: RiskGuard,
    sink: Box<dyn EventSink>,
    closed: HashMap<OrderId, Order>,
    client_ids: HashMap<String, OrderId>,
    ids: OrderIdGen,
    halted: HashMap<Symbol, String>,
}

impl OrderManager {
    pub fn new(book: Box<dyn Book>, limits: RiskLimits, sink: Box<dyn EventSink>) -> Self {
        Self::with_id_allocation(book, limits, sink, 1, 1)
    }

    /// Engine whose generated ids start at `start` and step by `stride`.
    /// The sharded front gives shard `s` of `n` the sequence `s + 1`,
    /// `s + 1 + n`, ...
    pub fn with_id_allocation(
        book: Box<dyn Book>,
        limits: RiskLimits,
        sink: Box<dyn EventSink>,
        start: u64,
        stride: u64,
    ) -> Self {
        Self {
            book,
            risk_guard: RiskGuard::new(limits),
            sink,
            closed: HashMap::new(),
            client_ids: HashMap::new(),
            ids: OrderIdGen::new(start, stride.max(1)),
            halted: HashMap::new(),
        }
    }

    /// Validates, records, risk-checks and either rests or rejects a new
    /// order.
    pub fn submit(&mut self, request: OrderRequest) -> Result<Submission> {
        request
            .validate()
            .map_err(|e| OmsError::InvalidRequest(e.to_string()))?;
        self.ensure_active(&request.symbol)?;

        let id = self.ids.next_id();
        let mut order = Order::new(id, &request);
        self.emit(OmsEvent::OrderCreated {
            id,
            client_id: order.client_id().map(str::to_owned),
            symbol: order.symbol().clone(),
            side: order.side(),
            quantity: order.quantity(),
            price: order.price(),
        });
        if let Some(client_id) = order.client_id() {
            if let Some(existing) = self.client_ids.insert(client_id.to_owned(), id) {
                warn!("client id {client_id} reused; was order {existing}, now {id}");
            }
        }

        let decision = self.risk_guard.check_order(&order);
        self.emit(OmsEvent::RiskCheck {
            id,
            symbol: order.symbol().clone(),
            side: order.side(),
            quantity: order.quantity(),
            passed: decision == RiskDecision::Approved,
            reason: match &decision {
                RiskDecision::Approved => None,
                RiskDecision::Rejected(reason) => Some(reason.clone()),
            },
        });

        match decision {
            RiskDecision::Approved => {
                self.apply_transition(&mut order, OrderState::Acked)?;
                self.book.add(order)?;
                info!("order {id} acked and resting");
                Ok(Submission::Accepted(id))
            }
            RiskDecision::Rejected(reason) => {
                self.apply_transition(&mut order, OrderState::Rejected)?;
                self.closed.insert(id, order);
                Ok(Submission::Rejected { id, reason })
            }
        }
    }

    pub fn fill(&mut self, id: OrderId) -> Result<()> {
        self.close(id, OrderState::Filled)
    }

    pub fn cancel(&mut self, id: OrderId) -> Result<()> {
        self.close(id, OrderState::Canceled)
    }

    fn close(&mut self, id: OrderId, to: OrderState) -> Result<()> {
        // terminal orders first: report the illegal transition without
        // touching the book
        if let Some(order) = self.closed.get(&id) {
            return Err(self.refuse_transition(id, order.state(), to));
        }
        let (symbol, from) = match self.book.get(id) {
            Some(order) => (order.symbol().clone(), order.state()),
            None => return Err(OmsError::Book(BookError::NotFound(id))),
        };
        self.ensure_active(&symbol)?;
        // legality before removal; a refused close leaves the book untouched
        if lifecycle::transition(from, to).is_err() {
            return Err(self.refuse_transition(id, from, to));
        }

        let mut order = self.book.remove(id)?;
        self.apply_transition(&mut order, to)?;
        if to == OrderState::Filled {
            if let Some(change) = self.risk_guard.record_fill(&order) {
                self.emit(OmsEvent::PositionUpdate {
                    symbol: change.symbol.clone(),
                    old: change.old,
                    new: change.new,
                    delta: change.delta,
                });
                self.closed.insert(id, order);
                return self.check_position_invariant(&change);
            }
        }
        self.closed.insert(id, order);
        Ok(())
    }

    /// Updates a resting order's quantity, and price when given. The book
    /// decides whether the time-priority slot survives.
    pub fn amend(&mut self, id: OrderId, new_quantity: u64, new_price: Option<f64>) -> Result<()> {
        if let Some(price) = new_price {
            if !(price.is_finite() && price > 0.0) {
                return Err(OmsError::InvalidRequest(format!(
                    "amend price must be positive and finite, got {price}"
                )));
            }
        }
        if let Some(order) = self.book.get(id) {
            let symbol = order.symbol().clone();
            self.ensure_active(&symbol)?;
        }
        self.book.amend(id, new_quantity, new_price)?;
        info!("order {id} amended");
        Ok(())
    }

    /// Applies one decoded wire message. Failures that are not already in
    /// the event stream (as a failed state change, a fatal halt, or a
    /// refused touch of a halted symbol) get a non-fatal error event, so
    /// the log stays a complete account of the run.
    pub fn apply(&mut self, msg: IngressMessage) -> Result<Applied> {
        let applied = self.dispatch(msg);
        if let Err(e) = &applied {
            match e {
                OmsError::Transition { .. } | OmsError::InvariantViolation { .. } => {}
                other => self.emit(OmsEvent::Error {
                    detail: other.to_string(),
                    fatal: false,
                }),
            }
        }
        applied
    }

    fn dispatch(&mut self, msg: IngressMessage) -> Result<Applied> {
        match msg {
            IngressMessage::NewOrder(request) => {
                Ok(Applied::Submitted(self.submit(request)?))
            }
            IngressMessage::Amend {
                order_id,
                client_id,
                quantity,
                price,
                ..
            } => {
                let id = self.resolve(order_id, client_id.as_deref())?;
                self.amend(id, quantity, price)?;
                Ok(Applied::Amended(id))
            }
            IngressMessage::Cancel {
                order_id, client_id, ..
            } => {
                let id = self.resolve(order_id, client_id.as_deref())?;
                self.cancel(id)?;
                Ok(Applied::Canceled(id))
            }
            IngressMessage::Execution {
                order_id,
                client_id,
                status,
                ..
            } => {
                let id = self.resolve(order_id, client_id.as_deref())?;
                match status {
                    ExecStatus::Filled => {
                        self.fill(id)?;
                        Ok(Applied::Filled(id))
                    }
                    ExecStatus::Canceled => {
                        self.cancel(id)?;
                        Ok(Applied::Canceled(id))
                    }
                }
            }
        }
    }

    fn resolve(&self, order_id: Option<OrderId>, client_id: Option<&str>) -> Result<OrderId> {
        if let Some(id) = order_id {
            return Ok(id);
        }
        let client_id = client_id.ok_or_else(|| {
            OmsError::InvalidRequest("message names neither an order id nor a client id".into())
        })?;
        self.client_ids
            .get(client_id)
            .copied()
            .ok_or_else(|| OmsError::UnknownClient(client_id.to_owned()))
    }

    /// Re-checks the book's price ordering for one symbol. A violation is
    /// unrecoverable for that symbol and halts it.
    pub fn audit(&mut self, symbol: &Symbol) -> Result<()> {
        for side in [Side::Buy, Side::Sell] {
            let keys: Vec<PriceKey> = self
                .book
                .orders(symbol, side)
                .iter()
                .map(|o| PriceKey::from_price(o.price()))
                .collect();
            for pair in keys.windows(2) {
                let ordered = match side {
                    Side::Buy => pair[0] >= pair[1],
                    Side::Sell => pair[0] <= pair[1],
                };
                if !ordered {
                    let detail = format!("{side} side lost its price ordering");
                    return Err(self.halt_symbol(symbol.clone(), detail));
                }
            }
        }
        Ok(())
    }

    pub fn best(&self, symbol: &Symbol, side: Side) -> Option<&Order> {
        self.book.best(symbol, side)
    }

    pub fn orders_at_price(&self, symbol: &Symbol, side: Side, price: f64) -> Vec<OrderId> {
        self.book.at_price(symbol, side, price)
    }

    /// Any order this engine has seen, resting or terminal.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.book.get(id).or_else(|| self.closed.get(&id))
    }

    pub fn order_state(&self, id: OrderId) -> Option<OrderState> {
        self.order(id).map(Order::state)
    }

    pub fn position(&self, symbol: &Symbol) -> i64 {
        self.risk_guard.position(symbol)
    }

    pub fn positions(&self) -> BTreeMap<Symbol, i64> {
        self.risk_guard.positions()
    }

    pub fn resting(&self) -> usize {
        self.book.len()
    }

    pub fn book_name(&self) -> &'static str {
        self.book.name()
    }

    pub fn is_halted(&self, symbol: &Symbol) -> bool {
        self.halted.contains_key(symbol)
    }

    pub fn halted_symbols(&self) -> Vec<Symbol> {
        self.halted.keys().cloned().collect()
    }

    pub fn order_counts(&self) -> StateCounts {
        let mut counts = StateCounts {
            acked: self.book.len(),
            ..StateCounts::default()
        };
        for order in self.closed.values() {
            match order.state() {
                OrderState::Filled => counts.filled += 1,
                OrderState::Canceled => counts.canceled += 1,
                OrderState::Rejected => counts.rejected += 1,
                OrderState::New | OrderState::Acked => {}
            }
        }
        counts
    }

    fn apply_transition(&mut self, order: &mut Order, to: OrderState) -> Result<()> {
        let from = order.state();
        match order.transition(to) {
            Ok(_) => {
                self.emit(OmsEvent::StateChange {
                    id: order.id(),
                    from,
                    to,
                    success: true,
                });
                Ok(())
            }
            Err(_) => Err(self.refuse_transition(order.id(), from, to)),
        }
    }

    /// Records a refused lifecycle move in the event stream and the log.
    fn refuse_transition(&self, id: OrderId, from: OrderState, to: OrderState) -> OmsError {
        self.emit(OmsEvent::StateChange {
            id,
            from,
            to,
            success: false,
        });
        warn!("order {id}: illegal transition {from} -> {to} ignored");
        OmsError::Transition {
            id,
            source: IllegalTransition { from, to },
        }
    }

    /// The guard only projects from the recorded position, so concurrent
    /// resting orders can overshoot the cap once they all fill. That breach
    /// is caught here, after the ledger write.
    fn check_position_invariant(&mut self, change: &PositionChange) -> Result<()> {
        let max = self.risk_guard.limits().max_position;
        if change.new.unsigned_abs() > max {
            let detail = format!("position {} exceeds max {max} after fill", change.new);
            return Err(self.halt_symbol(change.symbol.clone(), detail));
        }
        Ok(())
    }

    fn halt_symbol(&mut self, symbol: Symbol, detail: String) -> OmsError {
        self.emit(OmsEvent::Error {
            detail: format!("{symbol}: {detail}"),
            fatal: true,
        });
        warn!("halting {symbol}: {detail}");
        self.halted.insert(symbol.clone(), detail.clone());
        OmsError::InvariantViolation { symbol, detail }
    }

    /// Gate in front of every mutation. Touching a halted symbol is refused
    /// and the refusal itself is recorded, so the log accounts for traffic
    /// that arrived after the halt.
    fn ensure_active(&self, symbol: &Symbol) -> Result<()> {
        match self.halted.get(symbol) {
            Some(detail) => {
                self.emit(OmsEvent::Error {
                    detail: format!("{symbol} is halted: {detail}"),
                    fatal: false,
                });
                Err(OmsError::InvariantViolation {
                    symbol: symbol.clone(),
                    detail: detail.clone(),
                })
            }
            None => Ok(()),
        }
    }

    fn emit(&self, event: OmsEvent) {
        self.sink.emit(event);
    }
}
