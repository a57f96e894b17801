//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! dispatch engine and route compiler. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::pattern::Verb;

/// Root configuration for pattern dispatch and route compilation.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Pattern parser limits.
    pub parser: ParserConfig,

    /// Namespace candidate search settings.
    pub namespace: NamespaceConfig,

    /// Security validation pipeline settings.
    pub security: SecurityConfig,

    /// Resolution cache settings.
    pub cache: CacheConfig,

    /// Static route compiler settings.
    pub compiler: CompilerConfig,
}

/// Pattern parser limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum length of a full pattern string.
    pub max_pattern_len: usize,

    /// Maximum length of the method-name component.
    pub max_method_len: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_pattern_len: crate::pattern::parser::MAX_PATTERN_LEN,
            max_method_len: crate::pattern::parser::MAX_METHOD_LEN,
        }
    }
}

/// Namespace candidate search settings.
///
/// Qualified names are `::`-joined. The search tries the roots in the
/// fixed priority order documented on `NamespaceResolver`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NamespaceConfig {
    /// Primary controllers root, tried first.
    pub primary_root: String,

    /// Secondary controllers root (e.g. API controllers).
    pub secondary_root: String,

    /// Bare application root, tried last.
    pub app_root: String,

    /// Conventional suffix appended to the target base name.
    pub controller_suffix: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            primary_root: "app::controllers".to_string(),
            secondary_root: "app::api::controllers".to_string(),
            app_root: "app".to_string(),
            controller_suffix: "Controller".to_string(),
        }
    }
}

/// Security validation pipeline settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Method names denied outright (exact, case-insensitive).
    /// Covers constructors, destructors, magic dispatch hooks,
    /// middleware accessors and lifecycle hooks.
    pub method_blacklist: Vec<String>,

    /// Regexes denied against the method name (case-insensitive).
    pub blocked_patterns: Vec<String>,

    /// Base types a target or declaring class may not be or inherit
    /// from, and that no parameter may be typed as.
    pub dangerous_types: Vec<String>,

    /// Documentation markers that opt a method out of exposure.
    pub blocking_doc_markers: Vec<String>,

    /// Enforce verb semantics for destructive/mutating method names.
    pub enforce_verb_semantics: bool,

    /// Semantic substring → allowed verbs rules.
    pub verb_rules: Vec<VerbRule>,

    /// Require the host authorization hook to allow each target.
    /// When enabled without an installed hook, every target is denied.
    pub authorization_enabled: bool,
}

/// Maps method-name substrings to the HTTP verbs allowed to reach them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerbRule {
    /// Case-insensitive substrings of the method name this rule covers.
    pub substrings: Vec<String>,

    /// Verbs permitted when the rule matches.
    pub allowed: Vec<Verb>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            method_blacklist: [
                "__construct",
                "__destruct",
                "__call",
                "__callstatic",
                "__get",
                "__set",
                "__isset",
                "__unset",
                "__sleep",
                "__wakeup",
                "__clone",
                "__tostring",
                "__invoke",
                "construct",
                "destruct",
                "new",
                "clone",
                "drop",
                "invoke",
                "middleware",
                "get_middleware",
                "boot",
                "register",
                "mount",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            blocked_patterns: vec![
                "^_".to_string(),
                "password".to_string(),
                "token".to_string(),
                "secret".to_string(),
            ],
            dangerous_types: [
                "FileHandle",
                "DirectoryIterator",
                "DatabaseConnection",
                "QueryBuilder",
                "Reflection",
                "ProcessHandle",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            blocking_doc_markers: vec!["internal".to_string(), "no-expose".to_string()],
            enforce_verb_semantics: true,
            verb_rules: vec![
                VerbRule {
                    substrings: vec!["create".to_string(), "store".to_string()],
                    allowed: vec![Verb::Post],
                },
                VerbRule {
                    substrings: vec!["update".to_string()],
                    allowed: vec![Verb::Put, Verb::Patch],
                },
                VerbRule {
                    substrings: vec![
                        "destroy".to_string(),
                        "delete".to_string(),
                        "remove".to_string(),
                    ],
                    allowed: vec![Verb::Delete],
                },
            ],
            authorization_enabled: false,
        }
    }
}

/// Resolution cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable result caching.
    pub enabled: bool,

    /// Time-to-live for shared-tier entries in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
        }
    }
}

/// Validation policy for the route compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Any validation failure aborts the whole compilation.
    #[default]
    Strict,
    /// Failures are recorded; the failed route is excluded.
    Warning,
    /// Failures are recorded; the route is still emitted, annotated.
    Permissive,
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ValidationPolicy::Strict),
            "warning" => Ok(ValidationPolicy::Warning),
            "permissive" => Ok(ValidationPolicy::Permissive),
            other => Err(format!("unknown validation policy: {other}")),
        }
    }
}

/// Static route compiler settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Root directories to scan for templates.
    pub template_dirs: Vec<String>,

    /// Include globs applied to file paths (case-insensitive).
    pub include_globs: Vec<String>,

    /// Exclude globs applied to file paths (case-insensitive).
    pub exclude_globs: Vec<String>,

    /// Path of the generated route-table source file.
    pub output_path: String,

    /// How validation failures affect compilation.
    pub policy: ValidationPolicy,

    /// URL prefix the generated routes are grouped under.
    pub route_prefix: String,

    /// Default middleware set attached to every generated route.
    pub middleware: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            template_dirs: vec!["templates".to_string()],
            include_globs: vec!["**/*.html".to_string(), "**/*.tera".to_string()],
            exclude_globs: vec!["**/node_modules/**".to_string(), "**/vendor/**".to_string()],
            output_path: "generated/hx_routes.rs".to_string(),
            policy: ValidationPolicy::Strict,
            route_prefix: "hx".to_string(),
            middleware: vec!["web".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = DispatchConfig::default();
        assert!(config.security.method_blacklist.contains(&"__construct".to_string()));
        assert!(config.security.enforce_verb_semantics);
        assert_eq!(config.parser.max_pattern_len, 200);
        assert_eq!(config.compiler.policy, ValidationPolicy::Strict);
    }

    #[test]
    fn test_minimal_toml_round_trip() {
        let config: DispatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.cache.ttl_secs, 3600);

        let config: DispatchConfig = toml::from_str(
            r#"
            [compiler]
            template_dirs = ["views"]
            policy = "warning"
            "#,
        )
        .unwrap();
        assert_eq!(config.compiler.template_dirs, vec!["views"]);
        assert_eq!(config.compiler.policy, ValidationPolicy::Warning);
    }
}
