//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that configured denylist regexes actually compile
//! - Validate value ranges (length limits > 0, TTL > 0)
//! - Catch empty namespace roots and malformed globs early
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: DispatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::compiler::scanner::glob_to_regex;
use crate::config::schema::DispatchConfig;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. `security.blocked_patterns`).
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.parser.max_pattern_len == 0 {
        errors.push(ValidationError {
            field: "parser.max_pattern_len".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.parser.max_method_len == 0 {
        errors.push(ValidationError {
            field: "parser.max_method_len".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.parser.max_method_len > config.parser.max_pattern_len {
        errors.push(ValidationError {
            field: "parser.max_method_len".to_string(),
            message: "cannot exceed max_pattern_len".to_string(),
        });
    }

    for (field, value) in [
        ("namespace.primary_root", &config.namespace.primary_root),
        ("namespace.app_root", &config.namespace.app_root),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError {
                field: field.to_string(),
                message: "must not be empty".to_string(),
            });
        }
    }

    for (i, pattern) in config.security.blocked_patterns.iter().enumerate() {
        if let Err(e) = regex::Regex::new(&format!("(?i){pattern}")) {
            errors.push(ValidationError {
                field: format!("security.blocked_patterns[{i}]"),
                message: format!("invalid regex: {e}"),
            });
        }
    }

    for (i, rule) in config.security.verb_rules.iter().enumerate() {
        if rule.substrings.is_empty() || rule.allowed.is_empty() {
            errors.push(ValidationError {
                field: format!("security.verb_rules[{i}]"),
                message: "substrings and allowed verbs must both be non-empty".to_string(),
            });
        }
    }

    if config.cache.enabled && config.cache.ttl_secs == 0 {
        errors.push(ValidationError {
            field: "cache.ttl_secs".to_string(),
            message: "must be greater than zero when caching is enabled".to_string(),
        });
    }

    for (field, globs) in [
        ("compiler.include_globs", &config.compiler.include_globs),
        ("compiler.exclude_globs", &config.compiler.exclude_globs),
    ] {
        for (i, glob) in globs.iter().enumerate() {
            if glob_to_regex(glob).is_err() {
                errors.push(ValidationError {
                    field: format!("{field}[{i}]"),
                    message: format!("invalid glob: {glob:?}"),
                });
            }
        }
    }
    if config.compiler.include_globs.is_empty() {
        errors.push(ValidationError {
            field: "compiler.include_globs".to_string(),
            message: "at least one include glob is required".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&DispatchConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DispatchConfig::default();
        config.parser.max_pattern_len = 0;
        config.namespace.primary_root = String::new();
        config.security.blocked_patterns.push("(bad".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3, "expected all errors, got {errors:?}");
    }

    #[test]
    fn test_zero_ttl_rejected_only_when_cache_enabled() {
        let mut config = DispatchConfig::default();
        config.cache.ttl_secs = 0;
        assert!(validate_config(&config).is_err());

        config.cache.enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
