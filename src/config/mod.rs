//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatchConfig (validated, immutable)
//!     → shared via Arc to resolver and compiler
//!
//! fingerprint.rs hashes the resolution-relevant sections; the hash is
//! folded into every cache key so a config change invalidates all cached
//! resolutions without explicit eviction.
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a new resolver
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod fingerprint;
pub mod loader;
pub mod schema;
pub mod validation;

pub use fingerprint::config_fingerprint;
pub use loader::{load_config, ConfigError};
pub use schema::{
    CacheConfig, CompilerConfig, DispatchConfig, NamespaceConfig, ParserConfig, SecurityConfig,
    ValidationPolicy, VerbRule,
};
pub use validation::{validate_config, ValidationError};
