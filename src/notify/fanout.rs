//! In-process fan-out event bus.
//!
//! [`FanoutNotifier`] is the built-in [`Notifier`] implementation: a
//! synchronous publish/subscribe bus that delivers each published event to
//! every listener whose pattern matches the channel name, in registration
//! order, on the publishing thread.
//!
//! Instrumented code normally goes through [`FanoutNotifier::instrument`],
//! which times the operation and assigns a fresh correlation id before
//! publishing. [`FanoutNotifier::publish`] is the lower-level entry for
//! callers that measure timing themselves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::notifier::{BusEvent, EventCallback, ListenerId, Notifier};
use super::pattern::Pattern;
use super::payload::EventPayload;

struct Listener {
    id: ListenerId,
    pattern: Pattern,
    callback: EventCallback,
}

/// Synchronous in-process event bus.
///
/// Listeners are invoked on the publishing thread, outside the internal
/// listener lock, so a callback may safely subscribe or unsubscribe while
/// handling an event.
///
/// # Examples
///
/// ```
/// use querytrace::notify::{EventPayload, FanoutNotifier, Notifier};
/// use std::sync::Arc;
///
/// let bus = FanoutNotifier::new();
/// let id = bus.subscribe("sql.query".into(), Arc::new(|event| {
///     println!("{} took {} ms", event.name, event.duration_ms);
/// }));
///
/// bus.instrument("sql.query", EventPayload::new().with_sql("SELECT 1"), || {
///     // run the query...
/// });
///
/// bus.unsubscribe(id);
/// ```
pub struct FanoutNotifier {
    listeners: Mutex<Vec<Listener>>,
    next_id: AtomicU64,
}

impl FanoutNotifier {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Publish a pre-timed event to every matching listener.
    ///
    /// # Arguments
    ///
    /// * `name` - Channel name the event is published on
    /// * `payload` - Payload handed to each listener
    /// * `duration_ms` - Duration of the operation in milliseconds
    /// * `correlation_id` - Identifier grouping related events
    pub fn publish(&self, name: &str, payload: EventPayload, duration_ms: f64, correlation_id: &str) {
        let callbacks: Vec<EventCallback> = {
            let listeners = self.listeners.lock().unwrap();
            listeners
                .iter()
                .filter(|listener| listener.pattern.matches(name))
                .map(|listener| Arc::clone(&listener.callback))
                .collect()
        };

        for callback in callbacks {
            callback(BusEvent {
                name: name.to_string(),
                payload: payload.clone(),
                duration_ms,
                correlation_id: correlation_id.to_string(),
            });
        }
    }

    /// Run an operation, time it, and publish the result as an event.
    ///
    /// A fresh correlation id is generated for the event. The operation's
    /// return value is passed through unchanged.
    pub fn instrument<T>(&self, name: &str, payload: EventPayload, f: impl FnOnce() -> T) -> T {
        let correlation_id = Uuid::new_v4().simple().to_string();
        let started = Instant::now();
        let out = f();
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.publish(name, payload, duration_ms, &correlation_id);
        out
    }

    /// Remove every listener whose pattern matches the given channel name.
    ///
    /// This is the external-removal path: it detaches listeners without their
    /// holders' knowledge, the way a test harness or administrative reset
    /// would.
    pub fn unsubscribe_all(&self, name: &str) {
        let mut listeners = self.listeners.lock().unwrap();
        listeners.retain(|listener| !listener.pattern.matches(name));
    }

    /// Number of listeners whose pattern matches the given channel name.
    pub fn listener_count(&self, name: &str) -> usize {
        let listeners = self.listeners.lock().unwrap();
        listeners.iter().filter(|l| l.pattern.matches(name)).count()
    }
}

impl Default for FanoutNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for FanoutNotifier {
    fn subscribe(&self, pattern: Pattern, callback: EventCallback) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(%pattern, listener = id.0, "registering bus listener");
        let mut listeners = self.listeners.lock().unwrap();
        listeners.push(Listener {
            id,
            pattern,
            callback,
        });
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        let mut listeners = self.listeners.lock().unwrap();
        listeners.retain(|listener| listener.id != id);
    }

    fn is_active(&self, id: ListenerId) -> bool {
        let listeners = self.listeners.lock().unwrap();
        listeners.iter().any(|listener| listener.id == id)
    }
}
