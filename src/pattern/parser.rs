//! Pattern string parsing.
//!
//! # Responsibilities
//! - Split a raw `path@method` string into its components
//! - Enforce length bounds and the allowed character set
//! - Reject malformed input before any lookup work happens
//!
//! # Design Decisions
//! - Cheap checks first (length, charset) so attacker input fails fast
//! - No regex in the hot path; byte-level checks only
//! - Errors carry stable codes, not just messages

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default maximum length of a full pattern string.
pub const MAX_PATTERN_LEN: usize = 200;

/// Default maximum length of the method-name component.
pub const MAX_METHOD_LEN: usize = 100;

/// Errors produced while parsing a raw pattern string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input was empty (or whitespace only).
    #[error("pattern is empty")]
    EmptyPattern,

    /// Input exceeded the configured pattern length bound.
    #[error("pattern length {len} exceeds maximum {max}")]
    PatternTooLong { len: usize, max: usize },

    /// Input contained a character outside `[A-Za-z0-9_.@-]`.
    #[error("pattern contains invalid character {found:?}")]
    InvalidCharacters { found: char },

    /// No `@` separator present.
    #[error("pattern is missing the '@' separator")]
    MissingSeparator,

    /// More than one `@` separator present.
    #[error("pattern contains {count} '@' separators, expected exactly one")]
    MultipleSeparators { count: usize },

    /// Path or method side of the separator was empty.
    #[error("pattern has an empty {side} component")]
    EmptyComponent { side: &'static str },

    /// Path contained an empty dot-separated segment (e.g. `a..b`).
    #[error("pattern path contains an empty segment")]
    EmptySegment,

    /// Method name did not match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("method name {name:?} is not a valid identifier")]
    InvalidMethodName { name: String },

    /// Method name exceeded the configured method length bound.
    #[error("method name length {len} exceeds maximum {max}")]
    MethodNameTooLong { len: usize, max: usize },
}

impl ParseError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::EmptyPattern => "EMPTY_PATTERN",
            ParseError::PatternTooLong { .. } => "PATTERN_TOO_LONG",
            ParseError::InvalidCharacters { .. } => "INVALID_CHARACTERS",
            ParseError::MissingSeparator => "MISSING_SEPARATOR",
            ParseError::MultipleSeparators { .. } => "MULTIPLE_SEPARATORS",
            ParseError::EmptyComponent { .. } => "EMPTY_COMPONENT",
            ParseError::EmptySegment => "EMPTY_SEGMENT",
            ParseError::InvalidMethodName { .. } => "INVALID_METHOD_NAME",
            ParseError::MethodNameTooLong { .. } => "METHOD_NAME_TOO_LONG",
        }
    }
}

/// A validated dispatch pattern.
///
/// Immutable once parsed. Invariants guaranteed by construction:
/// - `path` is non-empty, dot-separated, segments match `[A-Za-z0-9_-]+`
/// - `method_name` matches `[A-Za-z_][A-Za-z0-9_]*` and respects the
///   configured length bound
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RoutePattern {
    raw: String,
    path: String,
    method_name: String,
}

impl RoutePattern {
    /// The input string this pattern was parsed from, trimmed. Equal to
    /// [`render`](Self::render) by construction, so reparsing a rendered
    /// pattern yields an identical value.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The namespace path (left of the separator).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The target method name (right of the separator).
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Canonical string form: `path@method`.
    pub fn render(&self) -> String {
        format!("{}@{}", self.path, self.method_name)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.method_name)
    }
}

/// Parses raw pattern strings under configurable length bounds.
#[derive(Debug, Clone)]
pub struct PatternParser {
    max_pattern_len: usize,
    max_method_len: usize,
}

impl Default for PatternParser {
    fn default() -> Self {
        Self {
            max_pattern_len: MAX_PATTERN_LEN,
            max_method_len: MAX_METHOD_LEN,
        }
    }
}

impl PatternParser {
    pub fn new(max_pattern_len: usize, max_method_len: usize) -> Self {
        Self {
            max_pattern_len,
            max_method_len,
        }
    }

    /// Parse a raw pattern string into a validated [`RoutePattern`].
    ///
    /// Deterministic, no side effects. Leading and trailing whitespace is
    /// tolerated; interior whitespace is rejected as an invalid character.
    pub fn parse(&self, raw: &str) -> Result<RoutePattern, ParseError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(ParseError::EmptyPattern);
        }
        let char_count = trimmed.chars().count();
        if char_count > self.max_pattern_len {
            return Err(ParseError::PatternTooLong {
                len: char_count,
                max: self.max_pattern_len,
            });
        }
        if let Some(found) = trimmed
            .chars()
            .find(|c| !matches!(c, 'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '.' | '-' | '@'))
        {
            return Err(ParseError::InvalidCharacters { found });
        }

        let separators = trimmed.matches('@').count();
        if separators == 0 {
            return Err(ParseError::MissingSeparator);
        }
        if separators > 1 {
            return Err(ParseError::MultipleSeparators { count: separators });
        }

        // Exactly one '@' at this point.
        let (path, method_name) = trimmed.split_once('@').ok_or(ParseError::MissingSeparator)?;
        let path = path.trim();
        let method_name = method_name.trim();

        if path.is_empty() {
            return Err(ParseError::EmptyComponent { side: "path" });
        }
        if method_name.is_empty() {
            return Err(ParseError::EmptyComponent { side: "method" });
        }
        if path.split('.').any(str::is_empty) {
            return Err(ParseError::EmptySegment);
        }

        if method_name.len() > self.max_method_len {
            return Err(ParseError::MethodNameTooLong {
                len: method_name.len(),
                max: self.max_method_len,
            });
        }
        if !is_valid_method_name(method_name) {
            return Err(ParseError::InvalidMethodName {
                name: method_name.to_string(),
            });
        }

        Ok(RoutePattern {
            raw: trimmed.to_string(),
            path: path.to_string(),
            method_name: method_name.to_string(),
        })
    }
}

/// True if `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_method_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> PatternParser {
        PatternParser::default()
    }

    #[test]
    fn test_parse_simple_pattern() {
        let p = parser().parse("users@index").unwrap();
        assert_eq!(p.path(), "users");
        assert_eq!(p.method_name(), "index");
        assert_eq!(p.raw(), "users@index");
    }

    #[test]
    fn test_parse_namespaced_pattern() {
        let p = parser().parse("admin.user-profile@show").unwrap();
        assert_eq!(p.path(), "admin.user-profile");
        assert_eq!(p.method_name(), "show");
    }

    #[test]
    fn test_render_round_trip() {
        for raw in [
            "users@index",
            "admin.users@create",
            "a.b-c.d_e@method_1",
            "  users@index \n",
        ] {
            let p = parser().parse(raw).unwrap();
            let reparsed = parser().parse(&p.render()).unwrap();
            assert_eq!(p, reparsed);
        }
    }

    #[test]
    fn test_empty_pattern() {
        assert_eq!(parser().parse("").unwrap_err(), ParseError::EmptyPattern);
        assert_eq!(parser().parse("   ").unwrap_err(), ParseError::EmptyPattern);
    }

    #[test]
    fn test_pattern_too_long() {
        let raw = format!("{}@index", "a".repeat(300));
        match parser().parse(&raw).unwrap_err() {
            ParseError::PatternTooLong { max, .. } => assert_eq!(max, MAX_PATTERN_LEN),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_characters() {
        for raw in ["users/index@show", "users@index()", "users@in dex", "usérs@index"] {
            let err = parser().parse(raw).unwrap_err();
            assert_eq!(err.code(), "INVALID_CHARACTERS", "input: {raw}");
        }
    }

    #[test]
    fn test_separator_count() {
        assert_eq!(
            parser().parse("users.index").unwrap_err(),
            ParseError::MissingSeparator
        );
        assert_eq!(
            parser().parse("users@index@extra").unwrap_err(),
            ParseError::MultipleSeparators { count: 2 }
        );
    }

    #[test]
    fn test_empty_components() {
        assert_eq!(
            parser().parse("@index").unwrap_err(),
            ParseError::EmptyComponent { side: "path" }
        );
        assert_eq!(
            parser().parse("users@").unwrap_err(),
            ParseError::EmptyComponent { side: "method" }
        );
    }

    #[test]
    fn test_empty_path_segment() {
        assert_eq!(
            parser().parse("admin..users@index").unwrap_err(),
            ParseError::EmptySegment
        );
        assert_eq!(parser().parse(".users@index").unwrap_err(), ParseError::EmptySegment);
    }

    #[test]
    fn test_method_name_shape() {
        // Leading underscore is syntactically valid; the security layer decides.
        assert!(parser().parse("users@_private").is_ok());
        // Digits cannot lead, dashes and dots are not identifier characters.
        assert_eq!(
            parser().parse("users@1index").unwrap_err().code(),
            "INVALID_METHOD_NAME"
        );
        assert_eq!(
            parser().parse("users@in-dex").unwrap_err().code(),
            "INVALID_METHOD_NAME"
        );
        assert_eq!(
            parser().parse("users@in.dex").unwrap_err().code(),
            "INVALID_METHOD_NAME"
        );
    }

    #[test]
    fn test_method_name_too_long() {
        let raw = format!("users@{}", "m".repeat(150));
        assert_eq!(parser().parse(&raw).unwrap_err().code(), "METHOD_NAME_TOO_LONG");
    }

    #[test]
    fn test_surrounding_whitespace_tolerated() {
        let p = parser().parse("  users@index \n").unwrap();
        assert_eq!(p.render(), "users@index");
        assert_eq!(p.raw(), "users@index");
    }

    #[test]
    fn test_length_bound_counts_chars_not_bytes() {
        // 156 chars but 306 bytes; the charset check must claim it.
        let raw = format!("{}@index", "é".repeat(150));
        assert_eq!(parser().parse(&raw).unwrap_err().code(), "INVALID_CHARACTERS");
    }
}
