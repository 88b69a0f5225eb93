//! The normalized event record.

use crate::notify::EventPayload;

/// A bus delivery normalized by a [`Subscriber`]: the raw callback arguments
/// plus a freshly captured, cleaned call stack.
///
/// Built per callback invocation and owned by the call stack that produced
/// it; never stored.
///
/// [`Subscriber`]: super::Subscriber
#[derive(Debug, Clone)]
pub struct TraceEvent {
    /// Cleaned call stack frames. May be empty.
    pub stack: Vec<String>,
    /// Payload supplied at the instrumentation site.
    pub payload: EventPayload,
    /// Duration of the instrumented operation in milliseconds.
    pub duration_ms: f64,
    /// Opaque identifier grouping related events.
    pub correlation_id: String,
    /// Channel the event arrived on.
    pub event_name: String,
}
