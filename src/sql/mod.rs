//! SQL query tracing: match, format, deliver.
//!
//! The pipeline is assembled by [`QueryTracer::builder`]: a
//! [`QueryMatcher`] decides which queries are interesting, a
//! [`TraceFormatter`] (by default [`SqlFormatter`]) renders the report,
//! and a [`TraceSink`] receives it.

pub mod formatter;
pub mod matcher;
pub mod options;
pub mod sink;
pub mod tracer;

pub use formatter::{SqlFormatter, TraceFormatter};
pub use matcher::QueryMatcher;
pub use options::TracerOptions;
pub use sink::{LogSink, MemorySink, TraceSink};
pub use tracer::{QueryTracer, QueryTracerBuilder, SQL_EVENT};
