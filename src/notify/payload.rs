//! Typed event payloads.
//!
//! Instrumented code attaches an [`EventPayload`] to every event it
//! publishes. The payload is typed once, at the bus boundary: the fields the
//! tracer cares about (`name` and `sql`) are first-class, and anything else
//! travels in a passthrough map of JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Kind marker for schema introspection queries. Events carrying this name
/// are never reported, regardless of the match predicate.
pub const SCHEMA_KIND: &str = "SCHEMA";

/// Kind marker for queries answered from the statement cache. Events carrying
/// this name are never reported, regardless of the match predicate.
pub const CACHE_KIND: &str = "CACHE";

/// Payload attached to a published event.
///
/// For SQL events, `name` carries the statement kind discriminator (for
/// example `"User Load"`, or the [`SCHEMA_KIND`]/[`CACHE_KIND`] markers) and
/// `sql` carries the query text. Other keys pass through untouched in
/// `extra`.
///
/// # Examples
///
/// ```
/// use querytrace::notify::EventPayload;
///
/// let payload = EventPayload::new()
///     .with_name("User Load")
///     .with_sql("SELECT * FROM users")
///     .with("connection_id", 7);
///
/// assert_eq!(payload.sql(), Some("SELECT * FROM users"));
/// assert!(!payload.is_schema());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl EventPayload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event kind discriminator.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the query text.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Attach an arbitrary passthrough value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The event kind discriminator, if present.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The query text, if present.
    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    /// Look up a passthrough value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Whether this event is a schema introspection query.
    pub fn is_schema(&self) -> bool {
        self.name.as_deref() == Some(SCHEMA_KIND)
    }

    /// Whether this event was answered from the statement cache.
    pub fn is_cached(&self) -> bool {
        self.name.as_deref() == Some(CACHE_KIND)
    }
}
