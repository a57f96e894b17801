//! Namespace candidate search.
//!
//! # Responsibilities
//! - Convert pattern path segments to capitalized-word class names
//! - Generate fully-qualified candidates in fixed priority order
//! - Return the first candidate the metadata provider knows about
//!
//! # Design Decisions
//! - Deterministic: same path always yields the same candidate list
//! - The NotFound error carries every attempted name for diagnostics
//! - Duplicate candidates are deduped preserving first occurrence

use thiserror::Error;

use crate::config::schema::NamespaceConfig;
use crate::security::metadata::MetadataProvider;

/// One fully-qualified name tried during resolution. Ephemeral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCandidate {
    pub qualified_name: String,
    pub suffix_applied: bool,
    pub priority: u32,
}

/// Error returned when no candidate class exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    /// No candidate matched; carries the full attempted list.
    #[error("no class found for path {path:?} (tried {attempted:?})")]
    NotFound {
        path: String,
        attempted: Vec<String>,
    },
}

/// Expands a pattern path into class-name candidates and picks the
/// first that exists.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    config: NamespaceConfig,
}

impl NamespaceResolver {
    pub fn new(config: NamespaceConfig) -> Self {
        Self { config }
    }

    /// Generate the ordered candidate list for a pattern path.
    ///
    /// Template order: primary root with suffix, primary root bare,
    /// secondary root with suffix, app root with suffix; then the two
    /// fallbacks (primary bare verbatim, primary with suffix-if-absent).
    pub fn candidates(&self, path: &str) -> Vec<TargetCandidate> {
        let segments: Vec<String> = path.split('.').map(to_capitalized_words).collect();
        let (base, namespace) = match segments.split_last() {
            Some((base, namespace)) => (base.clone(), namespace.to_vec()),
            None => return Vec::new(),
        };

        let suffix = &self.config.controller_suffix;
        let suffixed = format!("{base}{suffix}");
        let suffix_if_absent = if base.ends_with(suffix.as_str()) && !suffix.is_empty() {
            base.clone()
        } else {
            suffixed.clone()
        };

        let raw = [
            (self.config.primary_root.as_str(), suffixed.as_str(), true),
            (self.config.primary_root.as_str(), base.as_str(), false),
            (self.config.secondary_root.as_str(), suffixed.as_str(), true),
            (self.config.app_root.as_str(), suffixed.as_str(), true),
            // Fallbacks: case-converted segments verbatim under the
            // primary root, bare and with the suffix only if absent.
            (self.config.primary_root.as_str(), base.as_str(), false),
            (self.config.primary_root.as_str(), suffix_if_absent.as_str(), true),
        ];

        let mut seen = Vec::new();
        let mut candidates = Vec::new();
        for (priority, (root, class_name, suffix_applied)) in raw.into_iter().enumerate() {
            let qualified_name = join_qualified(root, &namespace, class_name);
            if seen.contains(&qualified_name) {
                continue;
            }
            seen.push(qualified_name.clone());
            candidates.push(TargetCandidate {
                qualified_name,
                suffix_applied,
                priority: priority as u32,
            });
        }
        candidates
    }

    /// Resolve a pattern path to the first existing class.
    pub fn resolve(
        &self,
        path: &str,
        provider: &dyn MetadataProvider,
    ) -> Result<String, NamespaceError> {
        let candidates = self.candidates(path);
        for candidate in &candidates {
            if provider.class_exists(&candidate.qualified_name) {
                tracing::debug!(
                    path = %path,
                    class = %candidate.qualified_name,
                    priority = candidate.priority,
                    "namespace candidate matched"
                );
                return Ok(candidate.qualified_name.clone());
            }
        }
        Err(NamespaceError::NotFound {
            path: path.to_string(),
            attempted: candidates.into_iter().map(|c| c.qualified_name).collect(),
        })
    }
}

fn join_qualified(root: &str, namespace: &[String], class_name: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(namespace.len() + 2);
    if !root.is_empty() {
        parts.push(root);
    }
    for segment in namespace {
        parts.push(segment);
    }
    parts.push(class_name);
    parts.join("::")
}

/// Convert a kebab/snake segment to capitalized-word form.
///
/// Every non-alphanumeric run is a word boundary; each word gets its
/// first letter uppercased, the remainder preserved as written.
/// `"user-profile"` → `"UserProfile"`, `"APIKeys"` → `"APIKeys"`.
pub fn to_capitalized_words(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for word in segment.split(|c: char| !c.is_ascii_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::metadata::{ClassMetadata, StaticMetadataRegistry};

    fn resolver() -> NamespaceResolver {
        NamespaceResolver::new(NamespaceConfig::default())
    }

    #[test]
    fn test_capitalized_words() {
        assert_eq!(to_capitalized_words("users"), "Users");
        assert_eq!(to_capitalized_words("user-profile"), "UserProfile");
        assert_eq!(to_capitalized_words("user_profile"), "UserProfile");
        assert_eq!(to_capitalized_words("UsersController"), "UsersController");
        assert_eq!(to_capitalized_words("v2"), "V2");
    }

    #[test]
    fn test_candidate_order() {
        let candidates = resolver().candidates("users");
        let names: Vec<&str> = candidates.iter().map(|c| c.qualified_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "app::controllers::UsersController",
                "app::controllers::Users",
                "app::api::controllers::UsersController",
                "app::UsersController",
            ]
        );
        assert!(candidates[0].suffix_applied);
        assert!(!candidates[1].suffix_applied);
    }

    #[test]
    fn test_namespaced_candidates() {
        let candidates = resolver().candidates("admin.users");
        assert_eq!(
            candidates[0].qualified_name,
            "app::controllers::Admin::UsersController"
        );
        assert_eq!(
            candidates[2].qualified_name,
            "app::api::controllers::Admin::UsersController"
        );
    }

    #[test]
    fn test_suffix_not_doubled_in_fallback() {
        let candidates = resolver().candidates("users-controller");
        let names: Vec<&str> = candidates.iter().map(|c| c.qualified_name.as_str()).collect();
        // The unconditional template doubles the suffix; the fallback
        // must not.
        assert!(names.contains(&"app::controllers::UsersControllerController"));
        assert!(names.contains(&"app::controllers::UsersController"));
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let registry = StaticMetadataRegistry::new()
            .with_class(ClassMetadata::new("app::controllers::UsersController"))
            .with_class(ClassMetadata::new("app::api::controllers::UsersController"));

        let resolved = resolver().resolve("users", &registry).unwrap();
        assert_eq!(resolved, "app::controllers::UsersController");
    }

    #[test]
    fn test_resolve_secondary_root() {
        let registry = StaticMetadataRegistry::new()
            .with_class(ClassMetadata::new("app::api::controllers::OrdersController"));

        let resolved = resolver().resolve("orders", &registry).unwrap();
        assert_eq!(resolved, "app::api::controllers::OrdersController");
    }

    #[test]
    fn test_not_found_carries_attempts() {
        let registry = StaticMetadataRegistry::new();
        let err = resolver().resolve("ghosts", &registry).unwrap_err();
        match err {
            NamespaceError::NotFound { path, attempted } => {
                assert_eq!(path, "ghosts");
                assert_eq!(attempted.len(), 4);
                assert!(attempted.contains(&"app::GhostsController".to_string()));
            }
        }
    }
}
