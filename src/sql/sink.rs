//! Delivery sinks for formatted trace messages.
//!
//! A [`TraceSink`] receives the final rendered message. Its output type is
//! whatever the sink produces; [`QueryTracer::handle`] returns that output
//! verbatim, so a sink can hand results back to the caller. Closures work
//! directly:
//!
//! ```
//! use querytrace::sql::TraceSink;
//!
//! let sink = |message: &str| message.len();
//! assert_eq!(sink.deliver("Matching Query"), 14);
//! ```
//!
//! [`QueryTracer::handle`]: super::QueryTracer::handle

use std::sync::{Arc, Mutex};
use tracing::warn;

/// Receives each formatted trace message.
pub trait TraceSink: Send + Sync {
    /// What delivery produces; propagated verbatim to the caller of
    /// [`QueryTracer::handle`](super::QueryTracer::handle).
    type Output;

    /// Deliver one formatted message.
    fn deliver(&self, message: &str) -> Self::Output;
}

impl<F, T> TraceSink for F
where
    F: Fn(&str) -> T + Send + Sync,
{
    type Output = T;

    fn deliver(&self, message: &str) -> T {
        self(message)
    }
}

/// Sink that emits each message through `tracing` at `WARN` level, under the
/// `querytrace` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    type Output = ();

    fn deliver(&self, message: &str) {
        warn!(target: "querytrace", "{message}");
    }
}

/// Sink that collects messages in memory. Clones share the same buffer, so a
/// handle kept outside the tracer sees everything delivered inside it.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message delivered so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Number of messages delivered so far.
    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// Whether nothing has been delivered yet.
    pub fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }
}

impl TraceSink for MemorySink {
    type Output = ();

    fn deliver(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
