//! Channel patterns for selecting which events a subscription receives.
//!
//! A [`Pattern`] is either an exact channel name or a regular expression
//! matched against channel names. Patterns are fixed when a subscription is
//! created and never change afterwards.

use regex::Regex;
use std::fmt;

/// Selects the channels a bus listener receives events from.
///
/// # Examples
///
/// ```
/// use querytrace::notify::Pattern;
/// use regex::Regex;
///
/// let exact: Pattern = "sql.query".into();
/// assert!(exact.matches("sql.query"));
/// assert!(!exact.matches("sql.query.cache"));
///
/// let matching: Pattern = Regex::new(r"^sql\.").unwrap().into();
/// assert!(matching.matches("sql.query"));
/// ```
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches a single channel name exactly.
    Exact(String),
    /// Matches any channel name the regular expression matches.
    Matching(Regex),
}

impl Pattern {
    /// Test whether a channel name is selected by this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Exact(channel) => channel == name,
            Pattern::Matching(re) => re.is_match(name),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(channel) => write!(f, "{channel}"),
            Pattern::Matching(re) => write!(f, "{}", re.as_str()),
        }
    }
}

impl From<&str> for Pattern {
    fn from(name: &str) -> Self {
        Pattern::Exact(name.to_string())
    }
}

impl From<String> for Pattern {
    fn from(name: String) -> Self {
        Pattern::Exact(name)
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Matching(re)
    }
}
