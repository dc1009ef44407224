use super::{OrderManager, StateCounts};
use crate::book::BookKind;
use crate::models::IngressMessage;
use crate::risk_guard::RiskLimits;
use log::{debug, info, warn};
use oms_api::{EventSink, OrderId, OrderState, Side, Symbol};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Builds one sink per shard. Sinks that share a sequence counter (clones
/// of one channel or memory sink) give the whole run a single ordered
/// stream.
pub type SinkFactory = Box<dyn Fn() -> Box<dyn EventSink>>;

/// Owned view of the top of one side, safe to send across shard replies.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub id: OrderId,
    pub quantity: u64,
    pub price: f64,
}

/// Merged or per-shard run summary.
#[derive(Debug, Default, Clone)]
pub struct ShardReport {
    pub counts: StateCounts,
    pub positions: BTreeMap<Symbol, i64>,
    pub resting: usize,
    pub halted: Vec<Symbol>,
}

enum ShardCommand {
    Apply(IngressMessage),
    Best {
        symbol: Symbol,
        side: Side,
        reply: Sender<Option<Quote>>,
    },
    Position {
        symbol: Symbol,
        reply: Sender<i64>,
    },
    OrderState {
        id: OrderId,
        reply: Sender<Option<OrderState>>,
    },
    Snapshot {
        reply: Sender<ShardReport>,
    },
    Shutdown,
}

fn run_worker(shard: usize, rx: Receiver<ShardCommand>, mut engine: OrderManager) {
    debug!("shard {shard} up");
    while let Ok(command) = rx.recv() {
        match command {
            ShardCommand::Apply(msg) => {
                if let Err(e) = engine.apply(msg) {
                    warn!("shard {shard}: {e}");
                }
            }
            ShardCommand::Best {
                symbol,
                side,
                reply,
            } => {
                let quote = engine.best(&symbol, side).map(|order| Quote {
                    id: order.id(),
                    quantity: order.quantity(),
                    price: order.price(),
                });
                let _ = reply.send(quote);
            }
            ShardCommand::Position { symbol, reply } => {
                let _ = reply.send(engine.position(&symbol));
            }
            ShardCommand::OrderState { id, reply } => {
                let _ = reply.send(engine.order_state(id));
            }
            ShardCommand::Snapshot { reply } => {
                let _ = reply.send(ShardReport {
                    counts: engine.order_counts(),
                    positions: engine.positions(),
                    resting: engine.resting(),
                    halted: engine.halted_symbols(),
                });
            }
            ShardCommand::Shutdown => break,
        }
    }
    debug!("shard {shard} down");
}

/// Runs `n` independent engines, one worker thread each, and routes every
/// message so that all traffic for a symbol lands on the same worker.
/// Commands queue in arrival order per shard, so a query sent after an
/// apply observes its effect.
pub struct ShardedOms {
    txs: Vec<Sender<ShardCommand>>,
    workers: Vec<JoinHandle<()>>,
}

impl ShardedOms {
    pub fn new(shards: usize, book: BookKind, limits: RiskLimits, sink_factory: SinkFactory) -> Self {
        let shards = shards.max(1);
        let mut txs = Vec::with_capacity(shards);
        let mut workers = Vec::with_capacity(shards);
        for shard in 0..shards {
            let (tx, rx) = mpsc::channel();
            let engine = OrderManager::with_id_allocation(
                book.build(),
                limits.clone(),
                sink_factory(),
                (shard + 1) as u64,
                shards as u64,
            );
            txs.push(tx);
            workers.push(thread::spawn(move || run_worker(shard, rx, engine)));
        }
        info!("started {shards} shard(s) with the {book} book");
        Self { txs, workers }
    }

    pub fn shards(&self) -> usize {
        self.txs.len()
    }

    /// Fire-and-forget; failures surface in the event stream and the log.
    pub fn apply(&self, msg: IngressMessage) {
        let shard = self.route(&msg);
        if self.txs[shard].send(ShardCommand::Apply(msg)).is_err() {
            warn!("shard {shard} is gone; message dropped");
        }
    }

    pub fn best(&self, symbol: &Symbol, side: Side) -> Option<Quote> {
        let shard = self.shard_for_symbol(symbol);
        let (reply, rx) = mpsc::channel();
        let command = ShardCommand::Best {
            symbol: symbol.clone(),
            side,
            reply,
        };
        if self.txs[shard].send(command).is_err() {
            return None;
        }
        rx.recv().ok().flatten()
    }

    pub fn position(&self, symbol: &Symbol) -> i64 {
        let shard = self.shard_for_symbol(symbol);
        let (reply, rx) = mpsc::channel();
        let command = ShardCommand::Position {
            symbol: symbol.clone(),
            reply,
        };
        if self.txs[shard].send(command).is_err() {
            return 0;
        }
        rx.recv().unwrap_or(0)
    }

    pub fn order_state(&self, id: OrderId) -> Option<OrderState> {
        let shard = self.shard_for_id(id);
        let (reply, rx) = mpsc::channel();
        if self.txs[shard].send(ShardCommand::OrderState { id, reply }).is_err() {
            return None;
        }
        rx.recv().ok().flatten()
    }

    /// Snapshot of every shard, merged. Positions never overlap because a
    /// symbol lives on exactly one shard.
    pub fn snapshot(&self) -> ShardReport {
        let mut merged = ShardReport::default();
        for tx in &self.txs {
            let (reply, rx) = mpsc::channel();
            if tx.send(ShardCommand::Snapshot { reply }).is_err() {
                continue;
            }
            if let Ok(report) = rx.recv() {
                merged.counts.absorb(report.counts);
                merged.resting += report.resting;
                merged.halted.extend(report.halted);
                for (symbol, position) in report.positions {
                    *merged.positions.entry(symbol).or_insert(0) += position;
                }
            }
        }
        merged
    }

    /// Drains every shard and joins the workers.
    pub fn shutdown(self) {
        for tx in &self.txs {
            let _ = tx.send(ShardCommand::Shutdown);
        }
        for worker in self.workers {
            if worker.join().is_err() {
                warn!("shard worker panicked");
            }
        }
        info!("all shards stopped");
    }

    /// Routes on symbol when the message names one, else on the order id's
    /// allocation stride, else to shard 0. Client-id-only messages have no
    /// reliable home; shard 0 reports them unknown if it never saw the id.
    fn route(&self, msg: &IngressMessage) -> usize {
        if let Some(symbol) = msg.symbol() {
            return self.shard_for_symbol(symbol);
        }
        if let Some(id) = msg.order_id() {
            return self.shard_for_id(id);
        }
        warn!("message names no symbol or order id; routing to shard 0");
        0
    }

    fn shard_for_symbol(&self, symbol: &Symbol) -> usize {
        let mut hasher = DefaultHasher::new();
        symbol.hash(&mut hasher);
        (hasher.finish() % self.txs.len() as u64) as usize
    }

    // ids from shard s are s + 1 (mod n), so this inverts the allocation
    fn shard_for_id(&self, id: OrderId) -> usize {
        ((id.value().saturating_sub(1)) % self.txs.len() as u64) as usize
    }
}
