//! Class and method metadata contract.
//!
//! The validator depends only on this abstract description of the host's
//! controllers. Hosts implement [`MetadataProvider`] however they like;
//! [`StaticMetadataRegistry`] is the shipped implementation used by the
//! CLI (loaded from JSON) and by tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Method visibility as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// One declared parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    pub name: String,

    /// Declared type, if any. `None` means untyped/opaque.
    #[serde(default)]
    pub type_name: Option<String>,
}

/// Description of a single method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMetadata {
    pub name: String,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub is_static: bool,

    #[serde(default)]
    pub is_abstract: bool,

    /// Class that actually declares this method, when inherited.
    /// `None` means the owning class declares it.
    #[serde(default)]
    pub declared_in: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterMetadata>,

    /// Documentation markers attached to the method (e.g. `internal`).
    #[serde(default)]
    pub doc_markers: Vec<String>,
}

impl MethodMetadata {
    /// A public, non-static, non-abstract method with no parameters.
    pub fn public(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            declared_in: None,
            parameters: Vec::new(),
            doc_markers: Vec::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn declared_in(mut self, class: impl Into<String>) -> Self {
        self.declared_in = Some(class.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, type_name: Option<&str>) -> Self {
        self.parameters.push(ParameterMetadata {
            name: name.into(),
            type_name: type_name.map(str::to_string),
        });
        self
    }

    pub fn with_doc_marker(mut self, marker: impl Into<String>) -> Self {
        self.doc_markers.push(marker.into());
        self
    }
}

/// Description of a single class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetadata {
    /// Fully-qualified class name (`::`-joined).
    pub name: String,

    /// Transitive ancestor chain, nearest first.
    #[serde(default)]
    pub ancestors: Vec<String>,

    #[serde(default)]
    pub methods: Vec<MethodMetadata>,
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ancestors: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_ancestor(mut self, ancestor: impl Into<String>) -> Self {
        self.ancestors.push(ancestor.into());
        self
    }

    pub fn with_method(mut self, method: MethodMetadata) -> Self {
        self.methods.push(method);
        self
    }

    /// Look up a method by exact name.
    pub fn method(&self, name: &str) -> Option<&MethodMetadata> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Capability trait the host implements to describe its classes.
pub trait MetadataProvider: Send + Sync {
    /// Describe a class by fully-qualified name, if it exists.
    fn describe_class(&self, name: &str) -> Option<ClassMetadata>;

    /// Existence check used by the namespace candidate search.
    fn class_exists(&self, name: &str) -> bool {
        self.describe_class(name).is_some()
    }
}

/// Statically-built metadata registry.
///
/// Serde-deserializable so the CLI can load one from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticMetadataRegistry {
    classes: HashMap<String, ClassMetadata>,
}

impl StaticMetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class description, replacing any previous one.
    pub fn register(&mut self, class: ClassMetadata) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn with_class(mut self, class: ClassMetadata) -> Self {
        self.register(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl MetadataProvider for StaticMetadataRegistry {
    fn describe_class(&self, name: &str) -> Option<ClassMetadata> {
        self.classes.get(name).cloned()
    }

    fn class_exists(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = StaticMetadataRegistry::new().with_class(
            ClassMetadata::new("app::controllers::UsersController")
                .with_method(MethodMetadata::public("index")),
        );

        assert!(registry.class_exists("app::controllers::UsersController"));
        assert!(!registry.class_exists("app::controllers::Missing"));

        let class = registry
            .describe_class("app::controllers::UsersController")
            .unwrap();
        assert!(class.method("index").is_some());
        assert!(class.method("missing").is_none());
    }

    #[test]
    fn test_registry_json_round_trip() {
        let registry = StaticMetadataRegistry::new().with_class(
            ClassMetadata::new("app::controllers::PostsController")
                .with_ancestor("app::controllers::BaseController")
                .with_method(
                    MethodMetadata::public("update")
                        .with_parameter("id", Some("u64"))
                        .with_doc_marker("internal"),
                ),
        );

        let json = serde_json::to_string(&registry).unwrap();
        let loaded: StaticMetadataRegistry = serde_json::from_str(&json).unwrap();
        assert!(loaded.class_exists("app::controllers::PostsController"));
        let class = loaded.describe_class("app::controllers::PostsController").unwrap();
        assert_eq!(class.ancestors, vec!["app::controllers::BaseController"]);
    }
}
