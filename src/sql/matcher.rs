//! Query match predicates.
//!
//! A [`QueryMatcher`] decides whether a query's text makes the event worth
//! reporting. Closures and [`regex::Regex`] both work directly:
//!
//! ```
//! use querytrace::sql::QueryMatcher;
//! use regex::Regex;
//!
//! let slow_tables = Regex::new(r"FROM (users|payments)").unwrap();
//! assert!(slow_tables.matches("SELECT * FROM users"));
//!
//! let everything = |_sql: &str| true;
//! assert!(everything.matches("SELECT 1"));
//! ```

use regex::Regex;

/// Predicate over query text.
pub trait QueryMatcher: Send + Sync {
    /// Whether an event carrying this query text should be reported.
    fn matches(&self, sql: &str) -> bool;
}

impl<F> QueryMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, sql: &str) -> bool {
        self(sql)
    }
}

impl QueryMatcher for Regex {
    fn matches(&self, sql: &str) -> bool {
        self.is_match(sql)
    }
}
