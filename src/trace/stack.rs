//! Call stack capture and cleaning.
//!
//! Stack frames flow through two seams. A [`StackSource`] produces the raw
//! frame strings for the current thread; a [`BacktraceCleaner`] then filters
//! or rewrites them. Both are injected into the [`Subscriber`], so tests can
//! substitute a fixed stack and applications can silence frames they never
//! want to see.
//!
//! [`Subscriber`]: super::Subscriber

use regex::Regex;
use std::sync::Arc;

/// Produces the raw call stack for the current thread.
pub trait StackSource: Send + Sync {
    /// Capture the current call stack as a list of frame strings.
    fn capture(&self) -> Vec<String>;
}

/// Captures the live call stack via the `backtrace` crate.
///
/// Frames with resolved debug info render as `file:line in symbol`; frames
/// without render as the bare symbol name.
#[cfg(feature = "capture")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeStackSource;

#[cfg(feature = "capture")]
impl StackSource for RuntimeStackSource {
    fn capture(&self) -> Vec<String> {
        let bt = backtrace::Backtrace::new();
        let mut frames = Vec::new();
        for frame in bt.frames() {
            for symbol in frame.symbols() {
                let name = symbol
                    .name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                match (symbol.filename(), symbol.lineno()) {
                    (Some(file), Some(line)) => {
                        frames.push(format!("{}:{} in {}", file.display(), line, name));
                    }
                    _ => frames.push(name),
                }
            }
        }
        frames
    }
}

/// Stack source that captures nothing. The fallback when the `capture`
/// feature is disabled, and useful in tests that do not care about frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStackSource;

impl StackSource for NullStackSource {
    fn capture(&self) -> Vec<String> {
        Vec::new()
    }
}

/// The default stack source for new subscribers.
pub fn default_stack_source() -> Arc<dyn StackSource> {
    #[cfg(feature = "capture")]
    {
        Arc::new(RuntimeStackSource)
    }
    #[cfg(not(feature = "capture"))]
    {
        Arc::new(NullStackSource)
    }
}

/// Filters or rewrites captured stack frames. Must be total: cleaning never
/// fails, it only drops or transforms frames.
pub trait BacktraceCleaner: Send + Sync {
    /// Clean a raw frame list.
    fn clean(&self, frames: Vec<String>) -> Vec<String>;
}

/// The identity transform: every frame passes through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCleaner;

impl BacktraceCleaner for IdentityCleaner {
    fn clean(&self, frames: Vec<String>) -> Vec<String> {
        frames
    }
}

/// Drops every frame matched by any of its silencer patterns.
///
/// # Examples
///
/// ```
/// use querytrace::trace::{BacktraceCleaner, SilencerCleaner};
/// use regex::Regex;
///
/// let cleaner = SilencerCleaner::new().add_silencer(Regex::new("vendor/").unwrap());
/// let frames = vec!["app/models/user.rs:10".to_string(), "vendor/lib.rs:5".to_string()];
/// assert_eq!(cleaner.clean(frames), vec!["app/models/user.rs:10".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SilencerCleaner {
    silencers: Vec<Regex>,
}

impl SilencerCleaner {
    /// Create a cleaner with no silencers (equivalent to the identity
    /// transform until silencers are added).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cleaner that silences framework-internal frames: this
    /// crate's own plumbing, the standard library, and cargo registry code.
    pub fn framework_default() -> Self {
        Self::new()
            .add_silencer(Regex::new(r"querytrace::").expect("valid silencer pattern"))
            .add_silencer(Regex::new(r"/rustc/").expect("valid silencer pattern"))
            .add_silencer(Regex::new(r"\.cargo[/\\]registry").expect("valid silencer pattern"))
    }

    /// Add a silencer pattern. Frames matching it are dropped.
    pub fn add_silencer(mut self, pattern: Regex) -> Self {
        self.silencers.push(pattern);
        self
    }
}

impl BacktraceCleaner for SilencerCleaner {
    fn clean(&self, frames: Vec<String>) -> Vec<String> {
        frames
            .into_iter()
            .filter(|frame| !self.silencers.iter().any(|re| re.is_match(frame)))
            .collect()
    }
}
