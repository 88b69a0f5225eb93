//! Error types and result alias for the querytrace library.
//!
//! This module defines the core error type [`TraceError`] and the [`Result`]
//! type alias used throughout the library. All errors are synchronous and
//! propagate directly to the caller; nothing is caught and retried
//! internally.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    /// A subscribe or unsubscribe request could not be confirmed against the
    /// bus. `op` is the operation that failed (`"subscribe"` or
    /// `"unsubscribe"`); `pattern` is the channel pattern the handle is
    /// attached to.
    #[error("{op} failed for {pattern}")]
    Subscription { op: &'static str, pattern: String },

    /// An invalid message prefix was supplied at construction time.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// An invalid stack line limit was supplied at construction time.
    #[error("invalid line limit: {0}")]
    InvalidLineLimit(String),
}

pub type Result<T> = std::result::Result<T, TraceError>;
