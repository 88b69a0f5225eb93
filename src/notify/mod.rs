//! In-process event bus: the boundary contract and the built-in fan-out
//! implementation.
//!
//! The tracer never talks to a concrete bus directly; it holds an injected
//! [`Notifier`] so that multiple independent tracers can coexist and be
//! tested in isolation, without shared global state.

pub mod fanout;
pub mod notifier;
pub mod pattern;
pub mod payload;

pub use fanout::FanoutNotifier;
pub use notifier::{BusEvent, EventCallback, ListenerId, Notifier};
pub use pattern::Pattern;
pub use payload::{EventPayload, CACHE_KIND, SCHEMA_KIND};
