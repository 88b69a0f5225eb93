//! Tracing matching SQL queries on an in-process instrumentation bus
//!
//! This example wires a [`QueryTracer`] into a [`FanoutNotifier`], publishes
//! a handful of simulated query events, and prints the traces the sink
//! collected. Only queries matching the predicate are reported; schema and
//! cache events are skipped even when they match.
//!
//! # Running the example
//!
//! ```bash
//! cargo run --example slow_queries
//! ```

use querytrace::notify::{EventPayload, FanoutNotifier, Notifier};
use querytrace::sql::{MemorySink, QueryTracer, SQL_EVENT};
use regex::Regex;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("{}", "=".repeat(80));
    println!("SQL Query Tracing Demonstration");
    println!("{}", "=".repeat(80));
    println!();

    let bus = Arc::new(FanoutNotifier::new());
    let sink = MemorySink::new();

    // Report every query that touches the users table.
    let matcher = Regex::new(r"(?i)\bfrom\s+users\b")?;
    let tracer = QueryTracer::builder(
        Arc::clone(&bus) as Arc<dyn Notifier>,
        matcher,
        sink.clone(),
    )
    .prefix("SLOW QUERY")
    .lines(10)
    .build()?;

    tracer.start()?;

    // Simulated application work. Each instrument call times the closure,
    // assigns a correlation id, and fans the event out to the tracer.
    bus.instrument(
        SQL_EVENT,
        EventPayload::new()
            .with_name("User Load")
            .with_sql("SELECT * FROM users WHERE id = 1"),
        || std::thread::sleep(std::time::Duration::from_millis(5)),
    );
    bus.instrument(
        SQL_EVENT,
        EventPayload::new()
            .with_name("Event Load")
            .with_sql("SELECT * FROM events ORDER BY created_at"),
        || (),
    );
    // Schema queries are excluded even though they mention the users table.
    bus.instrument(
        SQL_EVENT,
        EventPayload::new()
            .with_name("SCHEMA")
            .with_sql("CREATE INDEX idx_users_email ON users (email)"),
        || (),
    );
    bus.instrument(
        SQL_EVENT,
        EventPayload::new()
            .with_name("User Count")
            .with_sql("SELECT COUNT(*) FROM users"),
        || std::thread::sleep(std::time::Duration::from_millis(2)),
    );

    tracer.stop()?;

    // Events published after stop are ignored entirely.
    bus.instrument(
        SQL_EVENT,
        EventPayload::new().with_sql("SELECT * FROM users WHERE id = 2"),
        || (),
    );

    let messages = sink.messages();
    println!("Collected {} trace(s):", messages.len());
    println!();
    for (i, message) in messages.iter().enumerate() {
        println!("{}", "-".repeat(80));
        println!("Trace {}:", i + 1);
        println!("{}", message);
        println!();
    }

    println!("{}", "=".repeat(80));
    println!("Tracing demonstration complete!");
    println!("{}", "=".repeat(80));

    Ok(())
}
