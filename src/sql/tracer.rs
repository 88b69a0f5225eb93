//! The tracer controller: filter, format, deliver.
//!
//! [`QueryTracer`] holds the enable/disable state, owns one bus
//! [`Subscriber`] for its entire lifetime, and runs the filter-and-format
//! pipeline over every normalized event the subscriber forwards.
//!
//! # Control flow
//!
//! ```text
//! tracer.start() ──► subscriber.subscribe(pattern)
//!                         │
//! bus delivers event ─────┘
//!                         ▼
//!        subscriber captures + cleans the stack
//!                         ▼
//!                tracer.handle(event)
//!      disabled? ──► excluded kind? ──► predicate? ──► stack empty
//!                                                      after truncation?
//!                         ▼ (all pass)
//!              formatter.render ──► sink.deliver
//! ```
//!
//! # Lifecycle
//!
//! ```text
//!         start()              stop()
//!  [idle] -------> [active] -------> [idle]
//!     ^                |
//!     |   pause()      v
//!     +--------------- [paused]
//! ```
//!
//! `pause` only clears the enabled flag; the bus attachment stays, and
//! events are dropped at the filter stage, which makes re-enabling cheaper
//! than resubscribing. Only `start` and `stop` touch the bus. The controller
//! is reusable indefinitely across start/stop cycles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::error::{Result, TraceError};
use crate::notify::{Notifier, Pattern};
use crate::sql::formatter::{SqlFormatter, TraceFormatter};
use crate::sql::matcher::QueryMatcher;
use crate::sql::options::TracerOptions;
use crate::sql::sink::TraceSink;
use crate::trace::event::TraceEvent;
use crate::trace::stack::{BacktraceCleaner, IdentityCleaner, SilencerCleaner, StackSource};
use crate::trace::subscriber::{Subscriber, TraceCallback};

/// Default channel name SQL events are published on.
pub const SQL_EVENT: &str = "sql.query";

/// Traces matching SQL queries arriving on an instrumentation bus.
///
/// Built once via [`QueryTracer::builder`] and returned as an `Arc`; the
/// bus callback holds a weak back-reference, so dropping the last `Arc`
/// quiesces the tracer even if the bus still holds the listener.
///
/// # Examples
///
/// ```
/// use querytrace::notify::{EventPayload, FanoutNotifier};
/// use querytrace::sql::{MemorySink, QueryTracer, SQL_EVENT};
/// use std::sync::Arc;
///
/// let bus = Arc::new(FanoutNotifier::new());
/// let sink = MemorySink::new();
/// let tracer = QueryTracer::builder(bus.clone(), |sql: &str| sql.contains("users"), sink.clone())
///     .build()?;
///
/// tracer.start()?;
/// bus.instrument(SQL_EVENT, EventPayload::new().with_sql("SELECT * FROM users"), || ());
/// tracer.stop()?;
/// # Ok::<(), querytrace::TraceError>(())
/// ```
pub struct QueryTracer<S: TraceSink> {
    enabled: AtomicBool,
    lines: Option<usize>,
    matcher: Arc<dyn QueryMatcher>,
    formatter: Box<dyn TraceFormatter>,
    sink: S,
    subscriber: Subscriber,
}

impl<S: TraceSink> std::fmt::Debug for QueryTracer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryTracer")
            .field("enabled", &self.enabled)
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl<S: TraceSink + 'static> QueryTracer<S> {
    /// Start building a tracer.
    ///
    /// # Arguments
    ///
    /// * `notifier` - The bus to attach to
    /// * `matcher` - Predicate deciding which queries are reported
    /// * `sink` - Receiver of formatted trace messages
    pub fn builder(
        notifier: Arc<dyn Notifier>,
        matcher: impl QueryMatcher + 'static,
        sink: S,
    ) -> QueryTracerBuilder<S> {
        QueryTracerBuilder::new(notifier, Arc::new(matcher), sink)
    }

    /// Attach to the bus and enable tracing.
    ///
    /// The enabled flag is only set after the bus confirms the subscription,
    /// so a failed start leaves the tracer fully idle.
    ///
    /// # Errors
    ///
    /// [`TraceError::Subscription`] when the bus does not confirm the
    /// registration.
    pub fn start(&self) -> Result<&Self> {
        self.subscriber.subscribe()?;
        self.enabled.store(true, Ordering::SeqCst);
        debug!(pattern = %self.subscriber.pattern(), "query tracing started");
        Ok(self)
    }

    /// Disable tracing without touching the bus attachment. Events keep
    /// arriving and are dropped at the filter stage.
    pub fn pause(&self) -> &Self {
        self.enabled.store(false, Ordering::SeqCst);
        debug!(pattern = %self.subscriber.pattern(), "query tracing paused");
        self
    }

    /// Disable tracing and detach from the bus.
    ///
    /// # Errors
    ///
    /// [`TraceError::Subscription`] when the bus still reports the listener
    /// as live. The tracer is disabled either way.
    pub fn stop(&self) -> Result<&Self> {
        self.enabled.store(false, Ordering::SeqCst);
        self.subscriber.unsubscribe()?;
        debug!(pattern = %self.subscriber.pattern(), "query tracing stopped");
        Ok(self)
    }

    /// Whether events currently pass the enabled gate.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Whether the bus currently holds this tracer's listener.
    pub fn is_subscribed(&self) -> bool {
        self.subscriber.is_subscribed()
    }

    /// The configured stack depth bound, if any.
    pub fn lines(&self) -> Option<usize> {
        self.lines
    }

    /// Run one normalized event through the filter-and-format pipeline.
    ///
    /// Returns the sink's output when the event was reported, `None` when it
    /// was dropped at any stage: tracer disabled, schema/cache kind, no
    /// query text, predicate miss, stack empty after truncation and blank
    /// filtering, or formatter veto.
    pub fn handle(&self, event: &TraceEvent) -> Option<S::Output> {
        if !self.enabled.load(Ordering::SeqCst) {
            return None;
        }
        if event.payload.is_schema() || event.payload.is_cached() {
            return None;
        }
        let sql = event.payload.sql()?;
        if !self.matcher.matches(sql) {
            return None;
        }

        // Truncate raw entries first, then drop blanks.
        let take = self.lines.unwrap_or(event.stack.len());
        let stack: Vec<String> = event
            .stack
            .iter()
            .take(take)
            .filter(|frame| !frame.is_empty())
            .cloned()
            .collect();
        if stack.is_empty() {
            return None;
        }

        let message = self
            .formatter
            .render(&stack, sql, event.duration_ms, &event.correlation_id)?;
        Some(self.sink.deliver(&message))
    }
}

/// Builder for [`QueryTracer`].
pub struct QueryTracerBuilder<S: TraceSink> {
    notifier: Arc<dyn Notifier>,
    matcher: Arc<dyn QueryMatcher>,
    sink: S,
    pattern: Pattern,
    prefix: Option<String>,
    lines: Option<usize>,
    silence_framework_frames: bool,
    cleaner: Option<Arc<dyn BacktraceCleaner>>,
    stack_source: Option<Arc<dyn StackSource>>,
    formatter: Option<Box<dyn TraceFormatter>>,
}

impl<S: TraceSink + 'static> QueryTracerBuilder<S> {
    fn new(notifier: Arc<dyn Notifier>, matcher: Arc<dyn QueryMatcher>, sink: S) -> Self {
        Self {
            notifier,
            matcher,
            sink,
            pattern: Pattern::Exact(SQL_EVENT.to_string()),
            prefix: None,
            lines: None,
            silence_framework_frames: true,
            cleaner: None,
            stack_source: None,
            formatter: None,
        }
    }

    /// Channel pattern to attach to. Defaults to the exact channel
    /// [`SQL_EVENT`].
    pub fn pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Prefix prepended to every trace message.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Bound on stack depth retained per trace. Must be at least 1.
    pub fn lines(mut self, lines: usize) -> Self {
        self.lines = Some(lines);
        self
    }

    /// Whether framework-internal frames are silenced. Defaults to true.
    pub fn silence_framework_frames(mut self, silence: bool) -> Self {
        self.silence_framework_frames = silence;
        self
    }

    /// Replace the backtrace cleaner, overriding
    /// [`QueryTracerBuilder::silence_framework_frames`].
    pub fn cleaner(mut self, cleaner: Arc<dyn BacktraceCleaner>) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Replace the stack source.
    pub fn stack_source(mut self, source: Arc<dyn StackSource>) -> Self {
        self.stack_source = Some(source);
        self
    }

    /// Replace the formatter, overriding [`QueryTracerBuilder::prefix`].
    pub fn formatter(mut self, formatter: impl TraceFormatter + 'static) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// Apply validated [`TracerOptions`] (prefix, lines, silencing).
    pub fn options(mut self, options: TracerOptions) -> Self {
        self.prefix = options.prefix;
        self.lines = options.lines;
        self.silence_framework_frames = options.silence_framework_frames;
        self
    }

    /// Build the tracer, idle and unsubscribed.
    ///
    /// # Errors
    ///
    /// [`TraceError::InvalidLineLimit`] when `lines` is zero;
    /// [`TraceError::InvalidPrefix`] when the prefix is an empty string.
    pub fn build(self) -> Result<Arc<QueryTracer<S>>> {
        if self.lines == Some(0) {
            return Err(TraceError::InvalidLineLimit(
                "expected a positive integer, got: 0".to_string(),
            ));
        }

        let formatter: Box<dyn TraceFormatter> = match self.formatter {
            Some(formatter) => formatter,
            None => Box::new(SqlFormatter::new(self.prefix)?),
        };

        let cleaner: Arc<dyn BacktraceCleaner> = match self.cleaner {
            Some(cleaner) => cleaner,
            None if self.silence_framework_frames => {
                Arc::new(SilencerCleaner::framework_default())
            }
            None => Arc::new(IdentityCleaner),
        };

        let notifier = self.notifier;
        let pattern = self.pattern;
        let stack_source = self.stack_source;
        let lines = self.lines;
        let matcher = self.matcher;
        let sink = self.sink;

        Ok(Arc::new_cyclic(|weak: &Weak<QueryTracer<S>>| {
            let handler = weak.clone();
            let callback: TraceCallback = Arc::new(move |event: TraceEvent| {
                if let Some(tracer) = handler.upgrade() {
                    let _ = tracer.handle(&event);
                }
            });

            let mut subscriber = Subscriber::new(notifier, pattern, callback).with_cleaner(cleaner);
            if let Some(source) = stack_source {
                subscriber = subscriber.with_stack_source(source);
            }

            QueryTracer {
                enabled: AtomicBool::new(false),
                lines,
                matcher,
                formatter,
                sink,
                subscriber,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{EventPayload, FanoutNotifier};
    use crate::sql::sink::MemorySink;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct CountingMatcher {
        calls: Arc<AtomicUsize>,
        verdict: bool,
    }

    impl QueryMatcher for CountingMatcher {
        fn matches(&self, _sql: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict
        }
    }

    struct RecordingFormatter {
        stacks: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl TraceFormatter for RecordingFormatter {
        fn render(
            &self,
            stack: &[String],
            _sql: &str,
            _duration_ms: f64,
            _correlation_id: &str,
        ) -> Option<String> {
            self.stacks.lock().unwrap().push(stack.to_vec());
            Some("rendered".to_string())
        }
    }

    struct VetoFormatter;

    impl TraceFormatter for VetoFormatter {
        fn render(&self, _: &[String], _: &str, _: f64, _: &str) -> Option<String> {
            None
        }
    }

    fn always() -> impl QueryMatcher {
        |_sql: &str| true
    }

    fn sql_event(stack: &[&str]) -> TraceEvent {
        TraceEvent {
            stack: stack.iter().map(|s| s.to_string()).collect(),
            payload: EventPayload::new().with_sql("select * from users"),
            duration_ms: 100.0,
            correlation_id: "fedcba9876".to_string(),
            event_name: SQL_EVENT.to_string(),
        }
    }

    fn started_tracer(
        matcher: impl QueryMatcher + 'static,
    ) -> (Arc<QueryTracer<MemorySink>>, MemorySink) {
        let bus = Arc::new(FanoutNotifier::new());
        let sink = MemorySink::new();
        let tracer = QueryTracer::builder(bus, matcher, sink.clone())
            .build()
            .unwrap();
        tracer.start().unwrap();
        (tracer, sink)
    }

    #[test]
    fn test_built_idle_and_unsubscribed() {
        let bus = Arc::new(FanoutNotifier::new());
        let tracer = QueryTracer::builder(bus, always(), MemorySink::new())
            .build()
            .unwrap();
        assert!(!tracer.is_enabled());
        assert!(!tracer.is_subscribed());
    }

    #[test]
    fn test_start_subscribes_and_enables() {
        let bus = Arc::new(FanoutNotifier::new());
        let tracer = QueryTracer::builder(Arc::clone(&bus) as Arc<dyn Notifier>, always(), MemorySink::new())
            .build()
            .unwrap();
        tracer.start().unwrap();
        assert!(tracer.is_enabled());
        assert!(tracer.is_subscribed());
        assert_eq!(bus.listener_count(SQL_EVENT), 1);
    }

    #[test]
    fn test_stop_unsubscribes_and_disables() {
        let (tracer, _sink) = started_tracer(always());
        tracer.stop().unwrap();
        assert!(!tracer.is_enabled());
        assert!(!tracer.is_subscribed());
    }

    #[test]
    fn test_pause_disables_but_keeps_the_attachment() {
        let (tracer, _sink) = started_tracer(always());
        tracer.pause();
        assert!(!tracer.is_enabled());
        assert!(tracer.is_subscribed());
    }

    #[test]
    fn test_start_after_pause_does_not_resubscribe() {
        let bus = Arc::new(FanoutNotifier::new());
        let tracer = QueryTracer::builder(Arc::clone(&bus) as Arc<dyn Notifier>, always(), MemorySink::new())
            .build()
            .unwrap();
        tracer.start().unwrap();
        tracer.pause();
        tracer.start().unwrap();
        assert!(tracer.is_enabled());
        assert_eq!(bus.listener_count(SQL_EVENT), 1);
    }

    #[test]
    fn test_reusable_across_start_stop_cycles() {
        let (tracer, _sink) = started_tracer(always());
        for _ in 0..3 {
            tracer.stop().unwrap();
            assert!(!tracer.is_subscribed());
            tracer.start().unwrap();
            assert!(tracer.is_subscribed());
        }
    }

    #[test]
    fn test_failed_start_leaves_the_tracer_idle() {
        struct DeadBus;
        impl Notifier for DeadBus {
            fn subscribe(
                &self,
                _pattern: Pattern,
                _callback: crate::notify::EventCallback,
            ) -> crate::notify::ListenerId {
                crate::notify::ListenerId(1)
            }
            fn unsubscribe(&self, _id: crate::notify::ListenerId) {}
            fn is_active(&self, _id: crate::notify::ListenerId) -> bool {
                false
            }
        }

        let tracer = QueryTracer::builder(Arc::new(DeadBus), always(), MemorySink::new())
            .build()
            .unwrap();
        assert!(tracer.start().is_err());
        assert!(!tracer.is_enabled());
    }

    #[test]
    fn test_disabled_short_circuit_skips_the_predicate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bus = Arc::new(FanoutNotifier::new());
        let sink = MemorySink::new();
        let tracer = QueryTracer::builder(
            bus,
            CountingMatcher {
                calls: Arc::clone(&calls),
                verdict: true,
            },
            sink.clone(),
        )
        .build()
        .unwrap();

        assert_eq!(tracer.handle(&sql_event(&["line 1"])), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_schema_events_are_excluded_before_the_predicate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tracer, sink) = started_tracer(CountingMatcher {
            calls: Arc::clone(&calls),
            verdict: true,
        });

        let mut event = sql_event(&["line 1"]);
        event.payload = event.payload.with_name("SCHEMA");
        assert_eq!(tracer.handle(&event), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_cache_events_are_excluded_before_the_predicate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tracer, sink) = started_tracer(CountingMatcher {
            calls: Arc::clone(&calls),
            verdict: true,
        });

        let mut event = sql_event(&["line 1"]);
        event.payload = event.payload.with_name("CACHE");
        assert_eq!(tracer.handle(&event), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_predicate_miss_drops_the_event() {
        let (tracer, sink) = started_tracer(|_sql: &str| false);
        assert_eq!(tracer.handle(&sql_event(&["line 1"])), None);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_event_without_sql_is_dropped() {
        let (tracer, sink) = started_tracer(always());
        let mut event = sql_event(&["line 1"]);
        event.payload = EventPayload::new().with_name("User Load");
        assert_eq!(tracer.handle(&event), None);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_blank_frames_are_dropped_without_a_line_limit() {
        let stacks = Arc::new(Mutex::new(Vec::new()));
        let bus = Arc::new(FanoutNotifier::new());
        let tracer = QueryTracer::builder(bus, always(), MemorySink::new())
            .formatter(RecordingFormatter {
                stacks: Arc::clone(&stacks),
            })
            .build()
            .unwrap();
        tracer.start().unwrap();

        tracer.handle(&sql_event(&["line 1", "", "line 2", "", "line 3"]));

        let stacks = stacks.lock().unwrap();
        assert_eq!(
            stacks[0],
            vec!["line 1".to_string(), "line 2".to_string(), "line 3".to_string()]
        );
    }

    #[test]
    fn test_truncation_happens_before_blank_filtering() {
        let stacks = Arc::new(Mutex::new(Vec::new()));
        let bus = Arc::new(FanoutNotifier::new());
        let tracer = QueryTracer::builder(bus, always(), MemorySink::new())
            .lines(2)
            .formatter(RecordingFormatter {
                stacks: Arc::clone(&stacks),
            })
            .build()
            .unwrap();
        tracer.start().unwrap();

        tracer.handle(&sql_event(&["line 1", "", "line 2", "", "line 3"]));

        // first 2 raw entries, then blanks removed
        let stacks = stacks.lock().unwrap();
        assert_eq!(stacks[0], vec!["line 1".to_string()]);
    }

    #[test]
    fn test_all_blank_stack_short_circuits_before_the_formatter() {
        let stacks = Arc::new(Mutex::new(Vec::new()));
        let bus = Arc::new(FanoutNotifier::new());
        let tracer = QueryTracer::builder(bus, always(), MemorySink::new())
            .formatter(RecordingFormatter {
                stacks: Arc::clone(&stacks),
            })
            .build()
            .unwrap();
        tracer.start().unwrap();

        assert_eq!(tracer.handle(&sql_event(&["", "", ""])), None);
        assert!(stacks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_stack_short_circuits() {
        let (tracer, sink) = started_tracer(always());
        assert_eq!(tracer.handle(&sql_event(&[])), None);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_formatter_veto_skips_the_sink() {
        let bus = Arc::new(FanoutNotifier::new());
        let sink = MemorySink::new();
        let tracer = QueryTracer::builder(bus, always(), sink.clone())
            .formatter(VetoFormatter)
            .build()
            .unwrap();
        tracer.start().unwrap();

        assert_eq!(tracer.handle(&sql_event(&["line 1"])), None);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sink_output_is_returned_verbatim() {
        let bus = Arc::new(FanoutNotifier::new());
        let tracer = QueryTracer::builder(bus, always(), |message: &str| message.len())
            .build()
            .unwrap();
        tracer.start().unwrap();

        let event = sql_event(&["line 1"]);
        let expected = "Matching Query | 100 ms | #fedcba9876\n \
                        ** SQL: select * from users\n  >>> line 1"
            .len();
        assert_eq!(tracer.handle(&event), Some(expected));
    }

    #[test]
    fn test_matched_event_is_formatted_and_delivered() {
        let (tracer, sink) = started_tracer(always());
        tracer.handle(&sql_event(&["line 1", "line 2"]));
        assert_eq!(
            sink.messages(),
            vec![
                "Matching Query | 100 ms | #fedcba9876\n \
                 ** SQL: select * from users\n  >>> line 1\n  >>> line 2"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_zero_lines_fail_construction() {
        let bus = Arc::new(FanoutNotifier::new());
        let err = QueryTracer::builder(bus, always(), MemorySink::new())
            .lines(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, TraceError::InvalidLineLimit(_)));
    }

    #[test]
    fn test_empty_prefix_fails_construction() {
        let bus = Arc::new(FanoutNotifier::new());
        let err = QueryTracer::builder(bus, always(), MemorySink::new())
            .prefix("")
            .build()
            .unwrap_err();
        assert!(matches!(err, TraceError::InvalidPrefix(_)));
    }

    #[test]
    fn test_options_are_applied() {
        let options = TracerOptions {
            prefix: Some("DEBUG 54321".to_string()),
            lines: Some(1),
            silence_framework_frames: false,
        };
        let (tracer, sink) = {
            let bus = Arc::new(FanoutNotifier::new());
            let sink = MemorySink::new();
            let tracer = QueryTracer::builder(bus, always(), sink.clone())
                .options(options)
                .build()
                .unwrap();
            tracer.start().unwrap();
            (tracer, sink)
        };

        assert_eq!(tracer.lines(), Some(1));
        tracer.handle(&sql_event(&["line 1", "line 2"]));
        assert_eq!(
            sink.messages(),
            vec![
                "DEBUG 54321 | Matching Query | 100 ms | #fedcba9876\n \
                 ** SQL: select * from users\n  >>> line 1"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_end_to_end_through_the_bus() {
        let bus = Arc::new(FanoutNotifier::new());
        let sink = MemorySink::new();
        let tracer = QueryTracer::builder(
            Arc::clone(&bus) as Arc<dyn Notifier>,
            |sql: &str| sql.contains("users"),
            sink.clone(),
        )
        .stack_source(Arc::new(FixedStack(vec![
            "app/models/user.rs:10".to_string(),
            "app/controllers/users.rs:4".to_string(),
        ])))
        .cleaner(Arc::new(IdentityCleaner))
        .build()
        .unwrap();
        tracer.start().unwrap();

        bus.instrument(
            SQL_EVENT,
            EventPayload::new()
                .with_name("User Load")
                .with_sql("SELECT * FROM users"),
            || (),
        );
        bus.instrument(
            SQL_EVENT,
            EventPayload::new()
                .with_name("SCHEMA")
                .with_sql("SELECT * FROM users"),
            || (),
        );
        bus.instrument(
            SQL_EVENT,
            EventPayload::new().with_sql("SELECT * FROM events"),
            || (),
        );

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains(" ** SQL: SELECT * FROM users"));
        assert!(messages[0].contains(">>> app/models/user.rs:10"));
        assert!(messages[0].contains(">>> app/controllers/users.rs:4"));
    }

    #[test]
    fn test_paused_tracer_drops_bus_events() {
        let bus = Arc::new(FanoutNotifier::new());
        let sink = MemorySink::new();
        let tracer = QueryTracer::builder(
            Arc::clone(&bus) as Arc<dyn Notifier>,
            always(),
            sink.clone(),
        )
        .stack_source(Arc::new(FixedStack(vec!["frame".to_string()])))
        .cleaner(Arc::new(IdentityCleaner))
        .build()
        .unwrap();
        tracer.start().unwrap();
        tracer.pause();

        bus.instrument(SQL_EVENT, EventPayload::new().with_sql("SELECT 1"), || ());
        assert!(sink.is_empty());

        tracer.start().unwrap();
        bus.instrument(SQL_EVENT, EventPayload::new().with_sql("SELECT 1"), || ());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_dropping_the_tracer_quiesces_the_callback() {
        let bus = Arc::new(FanoutNotifier::new());
        let sink = MemorySink::new();
        let tracer = QueryTracer::builder(
            Arc::clone(&bus) as Arc<dyn Notifier>,
            always(),
            sink.clone(),
        )
        .stack_source(Arc::new(FixedStack(vec!["frame".to_string()])))
        .cleaner(Arc::new(IdentityCleaner))
        .build()
        .unwrap();
        tracer.start().unwrap();
        drop(tracer);

        // listener is still registered, but the weak back-reference is gone
        bus.instrument(SQL_EVENT, EventPayload::new().with_sql("SELECT 1"), || ());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_custom_pattern_is_honored() {
        let bus = Arc::new(FanoutNotifier::new());
        let sink = MemorySink::new();
        let tracer = QueryTracer::builder(
            Arc::clone(&bus) as Arc<dyn Notifier>,
            always(),
            sink.clone(),
        )
        .pattern("db.statement")
        .stack_source(Arc::new(FixedStack(vec!["frame".to_string()])))
        .cleaner(Arc::new(IdentityCleaner))
        .build()
        .unwrap();
        tracer.start().unwrap();

        bus.instrument(SQL_EVENT, EventPayload::new().with_sql("SELECT 1"), || ());
        bus.instrument("db.statement", EventPayload::new().with_sql("SELECT 2"), || ());

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("SELECT 2"));
    }

    struct FixedStack(Vec<String>);

    impl StackSource for FixedStack {
        fn capture(&self) -> Vec<String> {
            self.0.clone()
        }
    }
}
