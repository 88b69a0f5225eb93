//! Loosely-typed tracer configuration.
//!
//! [`TracerOptions`] validates, once, the options an application is likely to
//! read from an untyped source such as a JSON config blob or environment
//! plumbing. The builder on [`QueryTracer`] accepts the same options as
//! typed calls; this boundary exists for the dynamic path, where "lines" may
//! arrive as the string `"5"` and "prefix" may arrive as something that is
//! not a string at all.
//!
//! [`QueryTracer`]: super::QueryTracer

use serde_json::Value;

use crate::error::{Result, TraceError};

/// Validated tracer options.
#[derive(Debug, Clone)]
pub struct TracerOptions {
    /// Optional message prefix, non-empty when present.
    pub prefix: Option<String>,
    /// Optional bound on stack depth retained, at least 1 when present.
    pub lines: Option<usize>,
    /// Whether framework-internal frames are silenced from stacks.
    pub silence_framework_frames: bool,
}

impl Default for TracerOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            lines: None,
            silence_framework_frames: true,
        }
    }
}

impl TracerOptions {
    /// Validate options from an untyped JSON object.
    ///
    /// Recognized keys: `prefix` (non-empty string), `lines` (positive
    /// integer, or a string parseable as one), `silence_framework_frames`
    /// (boolean). `null` values and unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// [`TraceError::InvalidPrefix`] or [`TraceError::InvalidLineLimit`],
    /// each naming the offending value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut options = Self::default();

        if let Some(prefix) = value.get("prefix").filter(|v| !v.is_null()) {
            let Some(text) = prefix.as_str() else {
                return Err(TraceError::InvalidPrefix(format!(
                    "expected a string prefix, got: {prefix}"
                )));
            };
            if text.is_empty() {
                return Err(TraceError::InvalidPrefix(
                    "should not be empty, use null instead".to_string(),
                ));
            }
            options.prefix = Some(text.to_string());
        }

        if let Some(lines) = value.get("lines").filter(|v| !v.is_null()) {
            options.lines = Some(parse_lines(lines)?);
        }

        if let Some(flag) = value.get("silence_framework_frames").and_then(Value::as_bool) {
            options.silence_framework_frames = flag;
        }

        Ok(options)
    }
}

fn parse_lines(value: &Value) -> Result<usize> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n >= 1 => Ok(n as usize),
        _ => Err(TraceError::InvalidLineLimit(format!(
            "expected a positive integer, got: {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = TracerOptions::default();
        assert_eq!(options.prefix, None);
        assert_eq!(options.lines, None);
        assert!(options.silence_framework_frames);
    }

    #[test]
    fn test_empty_object_gives_defaults() {
        let options = TracerOptions::from_value(&json!({})).unwrap();
        assert_eq!(options.prefix, None);
        assert_eq!(options.lines, None);
        assert!(options.silence_framework_frames);
    }

    #[test]
    fn test_string_prefix_is_accepted() {
        let options = TracerOptions::from_value(&json!({"prefix": "DEBUG 54321"})).unwrap();
        assert_eq!(options.prefix.as_deref(), Some("DEBUG 54321"));
    }

    #[test]
    fn test_null_prefix_is_ignored() {
        let options = TracerOptions::from_value(&json!({"prefix": null})).unwrap();
        assert_eq!(options.prefix, None);
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let err = TracerOptions::from_value(&json!({"prefix": ""})).unwrap_err();
        assert!(err.to_string().contains("should not be empty"));
    }

    #[test]
    fn test_non_string_prefix_is_rejected_naming_the_value() {
        let err = TracerOptions::from_value(&json!({"prefix": 555})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid prefix: expected a string prefix, got: 555"
        );
    }

    #[test]
    fn test_integer_lines() {
        let options = TracerOptions::from_value(&json!({"lines": 5})).unwrap();
        assert_eq!(options.lines, Some(5));
    }

    #[test]
    fn test_string_lines_parse_as_integer() {
        let options = TracerOptions::from_value(&json!({"lines": "5"})).unwrap();
        assert_eq!(options.lines, Some(5));
    }

    #[test]
    fn test_zero_lines_are_rejected() {
        let err = TracerOptions::from_value(&json!({"lines": 0})).unwrap_err();
        assert!(matches!(err, TraceError::InvalidLineLimit(_)));
    }

    #[test]
    fn test_negative_lines_are_rejected() {
        let err = TracerOptions::from_value(&json!({"lines": -3})).unwrap_err();
        assert!(matches!(err, TraceError::InvalidLineLimit(_)));
    }

    #[test]
    fn test_fractional_lines_are_rejected() {
        let err = TracerOptions::from_value(&json!({"lines": 2.5})).unwrap_err();
        assert!(matches!(err, TraceError::InvalidLineLimit(_)));
    }

    #[test]
    fn test_unparseable_lines_are_rejected_naming_the_value() {
        let err = TracerOptions::from_value(&json!({"lines": "abc"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid line limit: expected a positive integer, got: \"abc\""
        );
    }

    #[test]
    fn test_silence_flag() {
        let options =
            TracerOptions::from_value(&json!({"silence_framework_frames": false})).unwrap();
        assert!(!options.silence_framework_frames);
    }
}
