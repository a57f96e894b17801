//! Configuration fingerprinting.
//!
//! Cache keys incorporate a hash of the resolution-relevant configuration
//! so that any parser, namespace or security change invalidates every
//! cached resolution without explicit eviction. Compiler and cache
//! sections are deliberately excluded: changing the output path must not
//! flush accept/reject decisions.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::schema::DispatchConfig;

#[derive(Serialize)]
struct FingerprintView<'a> {
    parser: &'a crate::config::schema::ParserConfig,
    namespace: &'a crate::config::schema::NamespaceConfig,
    security: &'a crate::config::schema::SecurityConfig,
}

/// Stable hex fingerprint of the resolution-relevant configuration.
pub fn config_fingerprint(config: &DispatchConfig) -> String {
    let view = FingerprintView {
        parser: &config.parser,
        namespace: &config.namespace,
        security: &config.security,
    };
    // Struct field order is fixed, so the JSON form is deterministic.
    let serialized = serde_json::to_string(&view).unwrap_or_default();

    let digest = Sha256::digest(serialized.as_bytes());
    let mut hex = String::with_capacity(16);
    for byte in &digest[..8] {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
