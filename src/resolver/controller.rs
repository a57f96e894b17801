//! Resolution orchestrator.
//!
//! # Responsibilities
//! - Drive parse → cache → namespace search → security validation
//! - Package the validated (class, method) pair for the host dispatcher
//! - Tag every failure with enough context for an actionable message
//!
//! # Design Decisions
//! - Single entry point: `resolve(raw_pattern, verb)`
//! - Steps are strictly sequential; any failure short-circuits
//! - Cache keys fold in the config fingerprint, so stale allow/deny
//!   decisions cannot survive a configuration change

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{CacheStatsSnapshot, CacheStore, ResolutionCache};
use crate::config::fingerprint::config_fingerprint;
use crate::config::schema::DispatchConfig;
use crate::pattern::{ParseError, PatternParser, Verb};
use crate::resolver::namespace::{NamespaceError, NamespaceResolver};
use crate::security::metadata::MetadataProvider;
use crate::security::validator::{
    AuthorizationHook, DenyReason, SecurityValidator, ValidatorBuildError, Verdict,
};

/// A successfully resolved dispatch target.
///
/// Immutable and safe to share read-only across concurrent resolutions
/// of the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Fully-qualified target class name.
    pub target_class: String,

    /// Validated method name.
    pub method_name: String,

    /// Canonical pattern this result was resolved from.
    pub source_pattern: String,
}

/// Errors surfaced by [`ControllerResolver::resolve`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The raw pattern was malformed.
    #[error("invalid pattern: {0}")]
    Parse(#[from] ParseError),

    /// No candidate class exists for the pattern path.
    #[error("no controller found for {pattern:?} (tried {attempted:?})")]
    NotFound {
        pattern: String,
        attempted: Vec<String>,
    },

    /// Security validation denied the resolved target.
    #[error("security denied {pattern:?} on {target_class}: {message}")]
    Denied {
        pattern: String,
        target_class: String,
        reason: DenyReason,
        message: String,
    },
}

impl ResolutionError {
    /// Stable machine-readable code. Denials use their layer's code so
    /// the host can map them to a forbidden outcome, distinct from the
    /// not-found mapping.
    pub fn code(&self) -> &'static str {
        match self {
            ResolutionError::Parse(e) => e.code(),
            ResolutionError::NotFound { .. } => "CONTROLLER_NOT_FOUND",
            ResolutionError::Denied { reason, .. } => reason.code(),
        }
    }
}

/// Orchestrates pattern-to-target resolution.
pub struct ControllerResolver {
    parser: PatternParser,
    namespace: NamespaceResolver,
    validator: SecurityValidator,
    cache: ResolutionCache,
    provider: Arc<dyn MetadataProvider>,
    fingerprint: String,
    cache_ttl: Duration,
    cache_enabled: bool,
}

impl ControllerResolver {
    /// Build a resolver from configuration and a metadata provider.
    ///
    /// The cache starts with the process-local tier only; attach a
    /// shared store with [`with_cache_store`](Self::with_cache_store).
    pub fn new(
        config: &DispatchConfig,
        provider: Arc<dyn MetadataProvider>,
    ) -> Result<Self, ValidatorBuildError> {
        let cache_ttl = Duration::from_secs(config.cache.ttl_secs);
        Ok(Self {
            parser: PatternParser::new(config.parser.max_pattern_len, config.parser.max_method_len),
            namespace: NamespaceResolver::new(config.namespace.clone()),
            validator: SecurityValidator::new(&config.security, &config.parser)?,
            cache: ResolutionCache::new(config.cache.enabled, cache_ttl, None),
            provider,
            fingerprint: config_fingerprint(config),
            cache_ttl,
            cache_enabled: config.cache.enabled,
        })
    }

    /// Attach the host's shared cache store as tier 2.
    pub fn with_cache_store(mut self, store: Box<dyn CacheStore>) -> Self {
        self.cache = ResolutionCache::new(self.cache_enabled, self.cache_ttl, Some(store));
        self
    }

    /// Install the host authorization collaborator.
    pub fn with_authorization_hook(mut self, hook: Arc<dyn AuthorizationHook>) -> Self {
        self.validator = self.validator.with_authorization_hook(hook);
        self
    }

    /// Resolve a raw pattern to a validated `(class, method)` pair.
    ///
    /// Never instantiates or invokes anything; that belongs to the
    /// host's dispatch collaborator.
    pub fn resolve(&self, raw: &str, verb: Verb) -> Result<ResolutionResult, ResolutionError> {
        let pattern = self.parser.parse(raw)?;
        let canonical = pattern.render();
        let key = self.cache_key(&canonical, verb);

        let result = self.cache.get_or_compute(&key, || {
            let target_class = self
                .namespace
                .resolve(pattern.path(), self.provider.as_ref())
                .map_err(|NamespaceError::NotFound { attempted, .. }| {
                    ResolutionError::NotFound {
                        pattern: canonical.clone(),
                        attempted,
                    }
                })?;

            match self.validator.validate(
                &target_class,
                pattern.method_name(),
                verb,
                self.provider.as_ref(),
            ) {
                Verdict::Allowed => Ok(ResolutionResult {
                    target_class,
                    method_name: pattern.method_name().to_string(),
                    source_pattern: canonical.clone(),
                }),
                Verdict::Denied { reason, message } => {
                    tracing::warn!(
                        pattern = %canonical,
                        class = %target_class,
                        code = reason.code(),
                        "security validation denied pattern"
                    );
                    Err(ResolutionError::Denied {
                        pattern: canonical.clone(),
                        target_class,
                        reason,
                        message,
                    })
                }
            }
        })?;

        tracing::debug!(
            pattern = %canonical,
            class = %result.target_class,
            method = %result.method_name,
            verb = %verb,
            "pattern resolved"
        );
        Ok(result)
    }

    /// Cache observability counters.
    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    /// Clear the process-local cache tier.
    pub fn clear_local_cache(&self) {
        self.cache.clear_local();
    }

    /// Fingerprint of the active resolution configuration.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn cache_key(&self, canonical: &str, verb: Verb) -> String {
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(verb.as_str().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(self.fingerprint.as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(32);
        for byte in &digest[..16] {
            hex.push_str(&format!("{byte:02x}"));
        }
        hex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryStore;
    use crate::security::metadata::{ClassMetadata, MethodMetadata, StaticMetadataRegistry};

    fn registry() -> Arc<StaticMetadataRegistry> {
        Arc::new(
            StaticMetadataRegistry::new()
                .with_class(
                    ClassMetadata::new("app::controllers::UsersController")
                        .with_method(MethodMetadata::public("index"))
                        .with_method(MethodMetadata::public("destroy")),
                )
                .with_class(
                    ClassMetadata::new("app::controllers::Admin::UsersController")
                        .with_method(MethodMetadata::public("create")),
                ),
        )
    }

    fn resolver() -> ControllerResolver {
        ControllerResolver::new(&DispatchConfig::default(), registry()).unwrap()
    }

    #[test]
    fn test_resolves_simple_pattern() {
        let result = resolver().resolve("users@index", Verb::Get).unwrap();
        assert_eq!(result.target_class, "app::controllers::UsersController");
        assert_eq!(result.method_name, "index");
        assert_eq!(result.source_pattern, "users@index");
    }

    #[test]
    fn test_resolves_namespaced_pattern() {
        let result = resolver().resolve("admin.users@create", Verb::Post).unwrap();
        assert_eq!(result.target_class, "app::controllers::Admin::UsersController");
    }

    #[test]
    fn test_blacklisted_method_denied() {
        let err = resolver()
            .resolve("admin.users@__construct", Verb::Get)
            .unwrap_err();
        assert_eq!(err.code(), "BLACKLISTED");
    }

    #[test]
    fn test_unknown_controller_not_found() {
        let err = resolver().resolve("ghosts@index", Verb::Get).unwrap_err();
        assert_eq!(err.code(), "CONTROLLER_NOT_FOUND");
        match err {
            ResolutionError::NotFound { attempted, .. } => assert!(!attempted.is_empty()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = resolver().resolve("users", Verb::Get).unwrap_err();
        assert_eq!(err.code(), "MISSING_SEPARATOR");
    }

    #[test]
    fn test_idempotent_and_cached() {
        let resolver = resolver();
        let first = resolver.resolve("users@index", Verb::Get).unwrap();
        let second = resolver.resolve("users@index", Verb::Get).unwrap();
        assert_eq!(first, second);

        let stats = resolver.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.tier1_hits, 1);
    }

    #[test]
    fn test_failures_not_cached() {
        let resolver = resolver();
        let _ = resolver.resolve("ghosts@index", Verb::Get).unwrap_err();
        let _ = resolver.resolve("ghosts@index", Verb::Get).unwrap_err();
        assert_eq!(resolver.cache_stats().misses, 2);
    }

    #[test]
    fn test_verb_is_part_of_cache_key() {
        let resolver = resolver();
        // destroy over DELETE is allowed; the GET attempt must not be
        // served from the DELETE entry.
        assert!(resolver.resolve("users@destroy", Verb::Delete).is_ok());
        assert_eq!(
            resolver.resolve("users@destroy", Verb::Get).unwrap_err().code(),
            "VERB_MISMATCH"
        );
    }

    #[test]
    fn test_config_change_invalidates_shared_tier() {
        let store: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());

        struct SharedStore(Arc<InMemoryStore>);
        impl CacheStore for SharedStore {
            fn get(&self, key: &str) -> Option<String> {
                self.0.get(key)
            }
            fn put(&self, key: &str, value: String, ttl: Duration) {
                self.0.put(key, value, ttl)
            }
        }

        let config = DispatchConfig::default();
        let first = ControllerResolver::new(&config, registry())
            .unwrap()
            .with_cache_store(Box::new(SharedStore(store.clone())));
        first.resolve("users@index", Verb::Get).unwrap();
        assert_eq!(store.len(), 1);

        // Same store, changed security config: the old entry's key can
        // never be produced again.
        let mut changed = config.clone();
        changed.security.method_blacklist.push("index".to_string());
        let second = ControllerResolver::new(&changed, registry())
            .unwrap()
            .with_cache_store(Box::new(SharedStore(store.clone())));
        assert_eq!(
            second.resolve("users@index", Verb::Get).unwrap_err().code(),
            "BLACKLISTED"
        );
        assert_eq!(second.cache_stats().tier2_hits, 0);
    }
}
