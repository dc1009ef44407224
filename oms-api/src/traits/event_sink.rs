use crate::model::event::OmsEvent;

/// Destination for the engine's event stream.
///
/// The engine holds a boxed sink handle and calls `emit` for every event it
/// produces; there is no global logger to reach for. Implementations stamp
/// the event with its record metadata (sequence number, record id, timestamp)
/// and must not block the caller: a slow consumer is the sink's problem, not
/// the engine's.
pub trait EventSink: Send {
    fn emit(&self, event: OmsEvent);
}
