//! Rendering matched events into diagnostic messages.
//!
//! [`SqlFormatter`] is a pure function from (stack, query text, duration,
//! correlation id) to one formatted string:
//!
//! ```text
//! [<prefix> | ]Matching Query | <duration> ms | #<correlation id>
//!  ** SQL: <query text, newlines escaped>
//!   >>> <frame 1>
//!   >>> <frame 2>
//! ```
//!
//! Embedded newlines in the query text are replaced with the two-character
//! literal `\n` so the whole query stays on one line. An empty stack produces
//! just the first two lines.

use crate::error::{Result, TraceError};

/// Renders a matched event into a message, or yields nothing to veto
/// delivery.
///
/// [`SqlFormatter`] always yields; a custom implementation may return `None`
/// to drop the event after matching.
pub trait TraceFormatter: Send + Sync {
    /// Render one matched event.
    ///
    /// # Arguments
    ///
    /// * `stack` - Cleaned, truncated call stack frames
    /// * `sql` - Query text
    /// * `duration_ms` - Duration of the query in milliseconds
    /// * `correlation_id` - Identifier grouping related events
    fn render(
        &self,
        stack: &[String],
        sql: &str,
        duration_ms: f64,
        correlation_id: &str,
    ) -> Option<String>;
}

/// The standard formatter. Stateless apart from an optional message prefix
/// fixed at construction; deterministic for all inputs.
#[derive(Debug, Clone, Default)]
pub struct SqlFormatter {
    prefix: Option<String>,
}

impl SqlFormatter {
    /// Create a formatter with an optional message prefix.
    ///
    /// # Errors
    ///
    /// [`TraceError::InvalidPrefix`] when the prefix is an empty string;
    /// pass `None` instead.
    pub fn new(prefix: Option<impl Into<String>>) -> Result<Self> {
        let prefix = match prefix {
            Some(prefix) => {
                let prefix = prefix.into();
                if prefix.is_empty() {
                    return Err(TraceError::InvalidPrefix(
                        "should not be empty, use None instead".to_string(),
                    ));
                }
                Some(prefix)
            }
            None => None,
        };
        Ok(Self { prefix })
    }

    /// The configured prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

impl TraceFormatter for SqlFormatter {
    fn render(
        &self,
        stack: &[String],
        sql: &str,
        duration_ms: f64,
        correlation_id: &str,
    ) -> Option<String> {
        let mut message = String::from("Matching Query");
        if let Some(prefix) = &self.prefix {
            message = format!("{prefix} | {message}");
        }
        message.push_str(&format!(" | {duration_ms} ms | #{correlation_id}"));
        message.push_str("\n ** SQL: ");
        message.push_str(&sql.replace('\n', "\\n"));
        for frame in stack {
            message.push_str("\n  >>> ");
            message.push_str(frame);
        }
        Some(message)
    }
}
