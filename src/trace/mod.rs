//! Subscription and normalization: one bus attachment, one normalized event
//! record per delivery.
//!
//! [`Subscriber`] owns the attachment lifecycle (subscribe, detect silent
//! detachment, idempotent re-subscribe/unsubscribe); [`TraceEvent`] is the
//! normalized record it forwards; the [`stack`] module provides the capture
//! and cleaning seams.

pub mod event;
pub mod stack;
pub mod subscriber;

pub use event::TraceEvent;
pub use stack::{
    default_stack_source, BacktraceCleaner, IdentityCleaner, NullStackSource, SilencerCleaner,
    StackSource,
};
#[cfg(feature = "capture")]
pub use stack::RuntimeStackSource;
pub use subscriber::{Subscriber, TraceCallback};
