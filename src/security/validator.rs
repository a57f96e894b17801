//! Security validation pipeline.
//!
//! # Responsibilities
//! - Decide whether a resolved `(class, method, verb)` triple may be
//!   exposed to the client
//! - Short-circuit on the first failing layer, cheap checks first
//! - Produce a stable reason code per denial
//!
//! # Pipeline (in order)
//! 1. Name shape (identifier regex, length bound)
//! 2. Blacklist (exact, case-insensitive)
//! 3. Leading underscore
//! 4. Pattern denylist (configured regexes)
//! 5. Existence & shape via metadata (public, non-static, non-abstract)
//! 6. Inheritance safety (dangerous base types)
//! 7. Parameter safety (dangerous parameter types)
//! 8. Declared-intent doc markers
//! 9. HTTP verb semantics (create→POST, update→PUT/PATCH, destroy→DELETE)
//! 10. Host authorization hook (fails closed when enabled without one)
//!
//! The blacklist runs before the underscore rule so blacklisted lifecycle
//! hooks (`__construct`) report BLACKLISTED rather than the generic
//! underscore denial.

use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::config::schema::{ParserConfig, SecurityConfig, VerbRule};
use crate::pattern::parser::is_valid_method_name;
use crate::pattern::Verb;
use crate::security::metadata::{ClassMetadata, MetadataProvider, Visibility};

/// Reason codes for security denials. Stable across releases; callers
/// and tests branch on these, never on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    InvalidName,
    UnderscoreBlocked,
    Blacklisted,
    PatternBlocked,
    MethodNotFound,
    NotPublic,
    StaticBlocked,
    AbstractBlocked,
    DangerousInheritance,
    DangerousParameterType,
    AnnotationBlocked,
    VerbMismatch,
    AuthorizationFailed,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::InvalidName => "INVALID_NAME",
            DenyReason::UnderscoreBlocked => "UNDERSCORE_BLOCKED",
            DenyReason::Blacklisted => "BLACKLISTED",
            DenyReason::PatternBlocked => "PATTERN_BLOCKED",
            DenyReason::MethodNotFound => "METHOD_NOT_FOUND",
            DenyReason::NotPublic => "NOT_PUBLIC",
            DenyReason::StaticBlocked => "STATIC_BLOCKED",
            DenyReason::AbstractBlocked => "ABSTRACT_BLOCKED",
            DenyReason::DangerousInheritance => "DANGEROUS_INHERITANCE",
            DenyReason::DangerousParameterType => "DANGEROUS_PARAMETER_TYPE",
            DenyReason::AnnotationBlocked => "ANNOTATION_BLOCKED",
            DenyReason::VerbMismatch => "VERB_MISMATCH",
            DenyReason::AuthorizationFailed => "AUTHORIZATION_FAILED",
        }
    }
}

/// Outcome of security validation. Never partially valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied { reason: DenyReason, message: String },
}

impl Verdict {
    fn denied(reason: DenyReason, message: impl Into<String>) -> Self {
        Verdict::Denied {
            reason,
            message: message.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

/// Host authorization collaborator, consulted as the final layer when
/// enabled in configuration.
pub trait AuthorizationHook: Send + Sync {
    fn allows(&self, target_class: &str, method_name: &str, verb: Verb) -> bool;
}

/// Error constructing a validator from configuration.
#[derive(Debug, Error)]
pub enum ValidatorBuildError {
    /// A configured denylist regex failed to compile.
    #[error("invalid blocked pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Runs the fixed validation pipeline against candidate targets.
pub struct SecurityValidator {
    blacklist: HashSet<String>,
    blocked_patterns: Vec<Regex>,
    dangerous_types: Vec<String>,
    doc_markers: Vec<String>,
    enforce_verb_semantics: bool,
    verb_rules: Vec<VerbRule>,
    authorization_enabled: bool,
    max_method_len: usize,
    hook: Option<Arc<dyn AuthorizationHook>>,
}

impl SecurityValidator {
    /// Build a validator, compiling the configured denylist regexes once.
    pub fn new(
        security: &SecurityConfig,
        parser: &ParserConfig,
    ) -> Result<Self, ValidatorBuildError> {
        let mut blocked_patterns = Vec::with_capacity(security.blocked_patterns.len());
        for pattern in &security.blocked_patterns {
            let compiled = Regex::new(&format!("(?i){pattern}")).map_err(|source| {
                ValidatorBuildError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })?;
            blocked_patterns.push(compiled);
        }

        Ok(Self {
            blacklist: security
                .method_blacklist
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
            blocked_patterns,
            dangerous_types: security.dangerous_types.clone(),
            doc_markers: security
                .blocking_doc_markers
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
            enforce_verb_semantics: security.enforce_verb_semantics,
            verb_rules: security.verb_rules.clone(),
            authorization_enabled: security.authorization_enabled,
            max_method_len: parser.max_method_len,
            hook: None,
        })
    }

    /// Install the host authorization collaborator.
    pub fn with_authorization_hook(mut self, hook: Arc<dyn AuthorizationHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Run the full pipeline. Pure over the supplied metadata.
    pub fn validate(
        &self,
        target_class: &str,
        method_name: &str,
        verb: Verb,
        provider: &dyn MetadataProvider,
    ) -> Verdict {
        // Layer 1: name shape.
        if method_name.len() > self.max_method_len || !is_valid_method_name(method_name) {
            return Verdict::denied(
                DenyReason::InvalidName,
                format!("method name {method_name:?} is not a valid identifier"),
            );
        }

        // Layer 2: blacklist.
        if self.blacklist.contains(&method_name.to_ascii_lowercase()) {
            return Verdict::denied(
                DenyReason::Blacklisted,
                format!("method {method_name:?} is blacklisted"),
            );
        }

        // Layer 3: leading underscore.
        if method_name.starts_with('_') {
            return Verdict::denied(
                DenyReason::UnderscoreBlocked,
                format!("method {method_name:?} starts with an underscore"),
            );
        }

        // Layer 4: pattern denylist.
        for pattern in &self.blocked_patterns {
            if pattern.is_match(method_name) {
                return Verdict::denied(
                    DenyReason::PatternBlocked,
                    format!("method {method_name:?} matches blocked pattern {:?}", pattern.as_str()),
                );
            }
        }

        // Layer 5: existence and shape.
        let class = match provider.describe_class(target_class) {
            Some(class) => class,
            None => {
                return Verdict::denied(
                    DenyReason::MethodNotFound,
                    format!("class {target_class:?} is unknown to the metadata provider"),
                );
            }
        };
        let method = match class.method(method_name) {
            Some(method) => method.clone(),
            None => {
                return Verdict::denied(
                    DenyReason::MethodNotFound,
                    format!("method {method_name:?} not found on {target_class:?}"),
                );
            }
        };
        if method.visibility != Visibility::Public {
            return Verdict::denied(
                DenyReason::NotPublic,
                format!("method {method_name:?} is not public"),
            );
        }
        if method.is_static {
            return Verdict::denied(
                DenyReason::StaticBlocked,
                format!("method {method_name:?} is static"),
            );
        }
        if method.is_abstract {
            return Verdict::denied(
                DenyReason::AbstractBlocked,
                format!("method {method_name:?} is abstract"),
            );
        }

        // Layer 6: inheritance safety, for both the target class and the
        // class that actually declares the method.
        if let Some(dangerous) = self.dangerous_lineage(&class) {
            return Verdict::denied(
                DenyReason::DangerousInheritance,
                format!("class {target_class:?} is or inherits dangerous type {dangerous:?}"),
            );
        }
        if let Some(declaring_name) = &method.declared_in {
            if declaring_name != target_class {
                match provider.describe_class(declaring_name) {
                    Some(declaring) => {
                        if let Some(dangerous) = self.dangerous_lineage(&declaring) {
                            return Verdict::denied(
                                DenyReason::DangerousInheritance,
                                format!(
                                    "declaring class {declaring_name:?} is or inherits dangerous type {dangerous:?}"
                                ),
                            );
                        }
                    }
                    None => {
                        // Unknown declaring class: treat the name itself as
                        // the whole lineage.
                        if let Some(dangerous) = self.match_dangerous(declaring_name) {
                            return Verdict::denied(
                                DenyReason::DangerousInheritance,
                                format!("declaring class matches dangerous type {dangerous:?}"),
                            );
                        }
                    }
                }
            }
        }

        // Layer 7: parameter safety.
        for parameter in &method.parameters {
            if let Some(type_name) = &parameter.type_name {
                if let Some(dangerous) = self.match_dangerous(type_name) {
                    return Verdict::denied(
                        DenyReason::DangerousParameterType,
                        format!(
                            "parameter {:?} has dangerous type {dangerous:?}",
                            parameter.name
                        ),
                    );
                }
            }
        }

        // Layer 8: declared-intent markers.
        for marker in &method.doc_markers {
            if self.doc_markers.contains(&marker.to_ascii_lowercase()) {
                return Verdict::denied(
                    DenyReason::AnnotationBlocked,
                    format!("method {method_name:?} carries do-not-expose marker {marker:?}"),
                );
            }
        }

        // Layer 9: verb semantics.
        if self.enforce_verb_semantics {
            let lowered = method_name.to_ascii_lowercase();
            for rule in &self.verb_rules {
                let matched = rule
                    .substrings
                    .iter()
                    .any(|s| lowered.contains(&s.to_ascii_lowercase()));
                if matched && !rule.allowed.contains(&verb) {
                    let allowed: Vec<&str> = rule.allowed.iter().map(Verb::as_str).collect();
                    return Verdict::denied(
                        DenyReason::VerbMismatch,
                        format!(
                            "method {method_name:?} requires one of {allowed:?}, got {verb}"
                        ),
                    );
                }
            }
        }

        // Layer 10: host authorization. Enabled without a hook fails
        // closed.
        if self.authorization_enabled {
            match &self.hook {
                Some(hook) if hook.allows(target_class, method_name, verb) => {}
                Some(_) => {
                    return Verdict::denied(
                        DenyReason::AuthorizationFailed,
                        format!("host authorization denied {target_class}::{method_name}"),
                    );
                }
                None => {
                    return Verdict::denied(
                        DenyReason::AuthorizationFailed,
                        "authorization is enabled but no hook is installed",
                    );
                }
            }
        }

        Verdict::Allowed
    }

    /// First dangerous type the class is, or inherits from.
    fn dangerous_lineage(&self, class: &ClassMetadata) -> Option<String> {
        if let Some(found) = self.match_dangerous(&class.name) {
            return Some(found);
        }
        class
            .ancestors
            .iter()
            .find_map(|ancestor| self.match_dangerous(ancestor))
    }

    /// A type name is dangerous if it equals a configured entry outright
    /// or its final `::` segment does.
    fn match_dangerous(&self, type_name: &str) -> Option<String> {
        let last_segment = type_name.rsplit("::").next().unwrap_or(type_name);
        self.dangerous_types
            .iter()
            .find(|d| d.as_str() == type_name || d.as_str() == last_segment)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DispatchConfig;
    use crate::security::metadata::{ClassMetadata, MethodMetadata, StaticMetadataRegistry};

    const USERS: &str = "app::controllers::UsersController";

    fn validator() -> SecurityValidator {
        let config = DispatchConfig::default();
        SecurityValidator::new(&config.security, &config.parser).unwrap()
    }

    fn registry() -> StaticMetadataRegistry {
        StaticMetadataRegistry::new().with_class(
            ClassMetadata::new(USERS)
                .with_method(MethodMetadata::public("index"))
                .with_method(MethodMetadata::public("destroy"))
                .with_method(MethodMetadata::public("storePassword"))
                .with_method(
                    MethodMetadata::public("hidden")
                        .with_visibility(Visibility::Protected),
                )
                .with_method(MethodMetadata::public("helper").with_static(true))
                .with_method(MethodMetadata::public("template").with_abstract(true))
                .with_method(
                    MethodMetadata::public("upload")
                        .with_parameter("file", Some("FileHandle")),
                )
                .with_method(MethodMetadata::public("report").with_doc_marker("internal")),
        )
    }

    fn expect_denied(verdict: Verdict, code: &str) {
        match verdict {
            Verdict::Denied { reason, .. } => assert_eq!(reason.code(), code),
            Verdict::Allowed => panic!("expected denial with code {code}"),
        }
    }

    #[test]
    fn test_allows_plain_public_method() {
        let verdict = validator().validate(USERS, "index", Verb::Get, &registry());
        assert!(verdict.is_allowed());
    }

    #[test]
    fn test_blacklist_wins_over_underscore() {
        // __construct is both underscore-prefixed and blacklisted; the
        // blacklist layer must claim it.
        let verdict = validator().validate(USERS, "__construct", Verb::Get, &registry());
        expect_denied(verdict, "BLACKLISTED");
    }

    #[test]
    fn test_underscore_blocked() {
        let verdict = validator().validate(USERS, "_internalHelper", Verb::Get, &registry());
        expect_denied(verdict, "UNDERSCORE_BLOCKED");
    }

    #[test]
    fn test_blacklist_is_case_insensitive() {
        let verdict = validator().validate(USERS, "MIDDLEWARE", Verb::Get, &registry());
        expect_denied(verdict, "BLACKLISTED");
    }

    #[test]
    fn test_pattern_denylist_blocks_sensitive_substrings() {
        let verdict = validator().validate(USERS, "storePassword", Verb::Post, &registry());
        expect_denied(verdict, "PATTERN_BLOCKED");
    }

    #[test]
    fn test_missing_class_and_method() {
        expect_denied(
            validator().validate("app::controllers::Ghost", "index", Verb::Get, &registry()),
            "METHOD_NOT_FOUND",
        );
        expect_denied(
            validator().validate(USERS, "missing", Verb::Get, &registry()),
            "METHOD_NOT_FOUND",
        );
    }

    #[test]
    fn test_shape_denials() {
        expect_denied(
            validator().validate(USERS, "hidden", Verb::Get, &registry()),
            "NOT_PUBLIC",
        );
        expect_denied(
            validator().validate(USERS, "helper", Verb::Get, &registry()),
            "STATIC_BLOCKED",
        );
        expect_denied(
            validator().validate(USERS, "template", Verb::Get, &registry()),
            "ABSTRACT_BLOCKED",
        );
    }

    #[test]
    fn test_dangerous_inheritance() {
        let registry = StaticMetadataRegistry::new().with_class(
            ClassMetadata::new(USERS)
                .with_ancestor("storage::DatabaseConnection")
                .with_method(MethodMetadata::public("index")),
        );
        expect_denied(
            validator().validate(USERS, "index", Verb::Get, &registry),
            "DANGEROUS_INHERITANCE",
        );
    }

    #[test]
    fn test_dangerous_declaring_class() {
        let registry = StaticMetadataRegistry::new()
            .with_class(
                ClassMetadata::new(USERS).with_method(
                    MethodMetadata::public("index").declared_in("lib::Reflection"),
                ),
            )
            .with_class(ClassMetadata::new("lib::Reflection").with_method(
                MethodMetadata::public("index"),
            ));
        expect_denied(
            validator().validate(USERS, "index", Verb::Get, &registry),
            "DANGEROUS_INHERITANCE",
        );
    }

    #[test]
    fn test_dangerous_parameter_type() {
        let verdict = validator().validate(USERS, "upload", Verb::Post, &registry());
        expect_denied(verdict, "DANGEROUS_PARAMETER_TYPE");
    }

    #[test]
    fn test_doc_marker_blocks() {
        let verdict = validator().validate(USERS, "report", Verb::Get, &registry());
        expect_denied(verdict, "ANNOTATION_BLOCKED");
    }

    #[test]
    fn test_verb_semantics() {
        // destroy over GET is denied, over DELETE allowed.
        expect_denied(
            validator().validate(USERS, "destroy", Verb::Get, &registry()),
            "VERB_MISMATCH",
        );
        assert!(validator()
            .validate(USERS, "destroy", Verb::Delete, &registry())
            .is_allowed());
    }

    #[test]
    fn test_verb_semantics_can_be_disabled() {
        let mut config = DispatchConfig::default();
        config.security.enforce_verb_semantics = false;
        let validator = SecurityValidator::new(&config.security, &config.parser).unwrap();
        assert!(validator.validate(USERS, "destroy", Verb::Get, &registry()).is_allowed());
    }

    #[test]
    fn test_authorization_hook() {
        struct DenyAll;
        impl AuthorizationHook for DenyAll {
            fn allows(&self, _: &str, _: &str, _: Verb) -> bool {
                false
            }
        }

        let mut config = DispatchConfig::default();
        config.security.authorization_enabled = true;
        let validator = SecurityValidator::new(&config.security, &config.parser)
            .unwrap()
            .with_authorization_hook(Arc::new(DenyAll));
        expect_denied(
            validator.validate(USERS, "index", Verb::Get, &registry()),
            "AUTHORIZATION_FAILED",
        );
    }

    #[test]
    fn test_authorization_enabled_without_hook_fails_closed() {
        let mut config = DispatchConfig::default();
        config.security.authorization_enabled = true;
        let validator = SecurityValidator::new(&config.security, &config.parser).unwrap();
        expect_denied(
            validator.validate(USERS, "index", Verb::Get, &registry()),
            "AUTHORIZATION_FAILED",
        );
    }

    #[test]
    fn test_blacklist_applies_to_any_class() {
        let other = "app::controllers::Admin::SettingsController";
        let registry = StaticMetadataRegistry::new().with_class(
            ClassMetadata::new(other).with_method(MethodMetadata::public("boot")),
        );
        expect_denied(
            validator().validate(other, "boot", Verb::Get, &registry),
            "BLACKLISTED",
        );
    }

    #[test]
    fn test_invalid_configured_regex_fails_construction() {
        let mut config = DispatchConfig::default();
        config.security.blocked_patterns.push("(unclosed".to_string());
        assert!(SecurityValidator::new(&config.security, &config.parser).is_err());
    }
}
