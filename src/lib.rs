pub mod error;
pub mod notify;
pub mod sql;
pub mod trace;

pub use error::{Result, TraceError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Result, TraceError};
    pub use crate::notify::{EventPayload, FanoutNotifier, Notifier, Pattern};
    pub use crate::sql::{
        LogSink, MemorySink, QueryTracer, SqlFormatter, TraceSink, TracerOptions, SQL_EVENT,
    };
    pub use crate::trace::{Subscriber, TraceEvent};
}
