use log::{info, warn};
use oms_api::{EventRecord, EventSink, OmsEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub mod writer;

pub use writer::run_event_writer;

/// Sink backed by an unbounded channel; the binary pairs it with a writer
/// task draining the far end. Clones share one sequence counter, so a
/// sharded engine still produces one global sequence. Sends from different
/// clones may interleave; `seq` is the authoritative order, not line order.
#[derive(Clone)]
pub struct ChannelSink {
    seq: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<EventRecord>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EventRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            seq: Arc::new(AtomicU64::new(0)),
            tx,
        };
        (sink, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: OmsEvent) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let record = EventRecord::new(seq, event);
        if self.tx.send(record).is_err() {
            warn!("event channel closed; record {seq} dropped");
        }
    }
}

/// In-process sink capturing every record. Used by tests and anywhere a run
/// wants to inspect its own event stream afterwards.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    seq: AtomicU64,
    records: Mutex<Vec<EventRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.inner
            .records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Event-kind names in emission order; keeps assertions short.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.records().iter().map(|r| r.event.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .records
            .lock()
            .map(|records| records.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: OmsEvent) {
        // sequence under the lock, so vec order always matches seq order
        if let Ok(mut records) = self.inner.records.lock() {
            let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed) + 1;
            records.push(EventRecord::new(seq, event));
        }
    }
}

/// Fallback when no event log path is configured: one JSON line per record
/// through the process log. Clones share the sequence counter.
#[derive(Clone, Default)]
pub struct LogSink {
    seq: Arc<AtomicU64>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for LogSink {
    fn emit(&self, event: OmsEvent) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let record = EventRecord::new(seq, event);
        match serde_json::to_string(&record) {
            Ok(line) => info!(target: "events", "{line}"),
            Err(e) => warn!("unserializable event record {seq}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(detail: &str) -> OmsEvent {
        OmsEvent::Error {
            detail: detail.into(),
            fatal: false,
        }
    }

    #[test]
    fn memory_sink_sequences_in_emission_order() {
        let sink = MemorySink::new();
        sink.emit(event("a"));
        sink.emit(event("b"));
        sink.emit(event("c"));

        let records = sink.records();
        assert_eq!(records.len(), 3);
        let seqs: Vec<u64> = records.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn clones_share_one_sequence() {
        let sink = MemorySink::new();
        let clone = sink.clone();
        sink.emit(event("a"));
        clone.emit(event("b"));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records().last().unwrap().seq, 2);
    }

    #[test]
    fn channel_sink_delivers_sequenced_records() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(event("x"));
        sink.emit(event("y"));

        assert_eq!(rx.try_recv().unwrap().seq, 1);
        assert_eq!(rx.try_recv().unwrap().seq, 2);
    }

    #[test]
    fn channel_sink_survives_a_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(event("nobody listening"));
    }
}
