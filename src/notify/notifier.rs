//! The bus boundary contract.
//!
//! Everything the tracer knows about the event bus goes through the
//! [`Notifier`] trait: register a listener, remove it, and ask whether it is
//! still live. The last of these is the reconciliation query — the bus may
//! drop a subscription out from under its holder (a test harness reset, an
//! administrative action), and the only source of truth for "am I still
//! subscribed" is the bus itself, never a cached flag.

use std::sync::Arc;

use super::pattern::Pattern;
use super::payload::EventPayload;

/// Opaque reference to a live bus subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A single delivery from the bus to a listener.
#[derive(Debug, Clone)]
pub struct BusEvent {
    /// Channel the event was published on.
    pub name: String,
    /// Payload supplied at the instrumentation site.
    pub payload: EventPayload,
    /// Duration of the instrumented operation in milliseconds.
    pub duration_ms: f64,
    /// Opaque identifier grouping related events.
    pub correlation_id: String,
}

/// Callback invoked synchronously by the bus for each matching event.
pub type EventCallback = Arc<dyn Fn(BusEvent) + Send + Sync>;

/// In-process publish/subscribe bus, as seen by a subscription handle.
///
/// Implementations deliver events synchronously to every listener whose
/// pattern matches the published channel name. [`FanoutNotifier`] is the
/// built-in implementation; applications with their own bus implement this
/// trait to plug the tracer in.
///
/// [`FanoutNotifier`]: super::FanoutNotifier
pub trait Notifier: Send + Sync {
    /// Register a listener for every channel the pattern matches.
    fn subscribe(&self, pattern: Pattern, callback: EventCallback) -> ListenerId;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: ListenerId);

    /// Whether the listener is still present in the bus's live set.
    fn is_active(&self, id: ListenerId) -> bool;
}
