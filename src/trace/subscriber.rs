//! Subscription handle: owns one attachment to the event bus.
//!
//! A [`Subscriber`] wraps a single bus subscription for its whole lifetime:
//! it registers the listener, detects silent detachment, and survives
//! repeated subscribe/unsubscribe calls as safe no-ops. On every received
//! event it captures the current call stack, cleans it, and forwards a
//! normalized [`TraceEvent`] to its callback.
//!
//! # Reconciliation
//!
//! The bus may be reset or have a subscription removed independently (a test
//! harness, an administrative action) without this handle's knowledge. Every
//! state-changing operation therefore re-derives truth from the bus instead
//! of trusting a cached flag: `subscribe` re-registers when the bus no longer
//! holds the listener, `unsubscribe` only clears the local reference once the
//! bus confirms removal, and [`Subscriber::is_subscribed`] never answers from
//! local state alone. Do not optimize the re-query away — it is what makes
//! double-subscribe, double-unsubscribe, and recovery after external removal
//! correct.

use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::{Result, TraceError};
use crate::notify::{BusEvent, EventCallback, ListenerId, Notifier, Pattern};
use crate::trace::event::TraceEvent;
use crate::trace::stack::{default_stack_source, BacktraceCleaner, IdentityCleaner, StackSource};

/// Callback invoked with each normalized event.
pub type TraceCallback = Arc<dyn Fn(TraceEvent) + Send + Sync>;

/// Owns the lifecycle of a single bus attachment.
///
/// # Examples
///
/// ```
/// use querytrace::notify::FanoutNotifier;
/// use querytrace::trace::Subscriber;
/// use std::sync::Arc;
///
/// let bus = Arc::new(FanoutNotifier::new());
/// let subscriber = Subscriber::new(bus, "sql.query", Arc::new(|event| {
///     println!("{}: {} ms", event.event_name, event.duration_ms);
/// }));
///
/// subscriber.subscribe()?;
/// assert!(subscriber.is_subscribed());
/// subscriber.unsubscribe()?;
/// # Ok::<(), querytrace::TraceError>(())
/// ```
pub struct Subscriber {
    pattern: Pattern,
    notifier: Arc<dyn Notifier>,
    callback: TraceCallback,
    cleaner: Arc<dyn BacktraceCleaner>,
    stack_source: Arc<dyn StackSource>,
    listener: Mutex<Option<ListenerId>>,
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("pattern", &self.pattern)
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl Subscriber {
    /// Create a detached handle. The pattern is fixed for the handle's
    /// lifetime; the cleaner defaults to the identity transform and the
    /// stack source to live capture.
    ///
    /// # Arguments
    ///
    /// * `notifier` - The bus to attach to
    /// * `pattern` - Exact channel name or regex selecting events
    /// * `callback` - Receiver of each normalized event
    pub fn new(
        notifier: Arc<dyn Notifier>,
        pattern: impl Into<Pattern>,
        callback: TraceCallback,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            notifier,
            callback,
            cleaner: Arc::new(IdentityCleaner),
            stack_source: default_stack_source(),
            listener: Mutex::new(None),
        }
    }

    /// Replace the backtrace cleaner.
    pub fn with_cleaner(mut self, cleaner: Arc<dyn BacktraceCleaner>) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// Replace the stack source.
    pub fn with_stack_source(mut self, source: Arc<dyn StackSource>) -> Self {
        self.stack_source = source;
        self
    }

    /// The pattern this handle was constructed with.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Whether the bus currently holds this handle's listener.
    ///
    /// True only if a local reference exists and the bus's live set still
    /// contains it; the local reference alone is never trusted.
    pub fn is_subscribed(&self) -> bool {
        let listener = self.listener.lock().unwrap();
        listener.map_or(false, |id| self.notifier.is_active(id))
    }

    /// Attach to the bus if not already attached, then confirm the
    /// attachment against the bus. Idempotent; re-attaches after an external
    /// removal.
    ///
    /// # Errors
    ///
    /// [`TraceError::Subscription`] tagged `"subscribe"` when the bus does
    /// not confirm the registration.
    pub fn subscribe(&self) -> Result<&Self> {
        self.do_subscribe(false)
    }

    /// Like [`Subscriber::subscribe`], but an unconfirmed registration is a
    /// silent no-op instead of an error.
    pub fn subscribe_silently(&self) -> &Self {
        // do_subscribe never fails in silent mode
        let _ = self.do_subscribe(true);
        self
    }

    /// Detach from the bus if attached, then confirm the removal against the
    /// bus. Idempotent.
    ///
    /// # Errors
    ///
    /// [`TraceError::Subscription`] tagged `"unsubscribe"` when the bus
    /// still reports the listener as live.
    pub fn unsubscribe(&self) -> Result<&Self> {
        self.do_unsubscribe(false)
    }

    /// Like [`Subscriber::unsubscribe`], but an unconfirmed removal is a
    /// silent no-op instead of an error.
    pub fn unsubscribe_silently(&self) -> &Self {
        let _ = self.do_unsubscribe(true);
        self
    }

    fn do_subscribe(&self, silent: bool) -> Result<&Self> {
        let mut listener = self.listener.lock().unwrap();

        let live = listener.map_or(false, |id| self.notifier.is_active(id));
        if !live {
            let id = self.notifier.subscribe(self.pattern.clone(), self.bus_callback());
            *listener = Some(id);
            debug!(pattern = %self.pattern, "registered bus listener");
        }

        // Reconcile: the bus may accept the call without registering.
        let confirmed = listener.map_or(false, |id| self.notifier.is_active(id));
        if !confirmed {
            *listener = None;
            if !silent {
                return Err(TraceError::Subscription {
                    op: "subscribe",
                    pattern: self.pattern.to_string(),
                });
            }
            warn!(pattern = %self.pattern, "bus did not confirm subscription");
        }
        Ok(self)
    }

    fn do_unsubscribe(&self, silent: bool) -> Result<&Self> {
        let mut listener = self.listener.lock().unwrap();

        if let Some(id) = *listener {
            self.notifier.unsubscribe(id);
            if self.notifier.is_active(id) {
                if !silent {
                    return Err(TraceError::Subscription {
                        op: "unsubscribe",
                        pattern: self.pattern.to_string(),
                    });
                }
                warn!(pattern = %self.pattern, "bus did not confirm removal");
            } else {
                *listener = None;
                debug!(pattern = %self.pattern, "removed bus listener");
            }
        }
        Ok(self)
    }

    /// Build the raw bus callback: capture the stack, clean it, normalize
    /// the delivery, forward it.
    fn bus_callback(&self) -> EventCallback {
        let callback = Arc::clone(&self.callback);
        let cleaner = Arc::clone(&self.cleaner);
        let stack_source = Arc::clone(&self.stack_source);
        Arc::new(move |event: BusEvent| {
            let stack = cleaner.clean(stack_source.capture());
            callback(TraceEvent {
                stack,
                payload: event.payload,
                duration_ms: event.duration_ms,
                correlation_id: event.correlation_id,
                event_name: event.name,
            });
        })
    }
}
