//! Two-tier resolution cache.
//!
//! # Data Flow
//! ```text
//! cache key (hash of pattern + verb + config fingerprint)
//!     → tier 1: process-local DashMap (no TTL, lives with the resolver)
//!     → tier 2: host-supplied CacheStore (TTL, shared across processes)
//!     → miss: compute, store on success only
//! ```
//!
//! # Design Decisions
//! - Failures are never cached, so transient misconfiguration self-heals
//! - No single-flight: concurrent identical misses recompute; validation
//!   is pure, so the duplicated work is wasted CPU, not a hazard
//! - Stats are observability only, never consulted for correctness

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::resolver::controller::ResolutionResult;

/// Capability trait for the shared cache tier.
///
/// The host typically backs this with its key/value store. Entries are
/// serialized [`ResolutionResult`]s; the store never interprets them.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String, ttl: Duration);
}

/// In-memory [`CacheStore`] with per-entry expiry.
///
/// Default tier-2 implementation; also what the tests use.
#[derive(Default)]
pub struct InMemoryStore {
    entries: DashMap<String, (String, Instant)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                let (value, deadline) = entry.value();
                if Instant::now() < *deadline {
                    return Some(value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn put(&self, key: &str, value: String, ttl: Duration) {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }
}

/// Counters for cache observability.
#[derive(Debug, Default)]
pub struct CacheStats {
    attempts: AtomicU64,
    tier1_hits: AtomicU64,
    tier2_hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

/// Point-in-time view of [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub attempts: u64,
    pub tier1_hits: u64,
    pub tier2_hits: u64,
    pub misses: u64,
    pub stores: u64,
}

impl CacheStats {
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            tier1_hits: self.tier1_hits.load(Ordering::Relaxed),
            tier2_hits: self.tier2_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }
}

/// Two-tier cache for successful resolutions.
pub struct ResolutionCache {
    enabled: bool,
    ttl: Duration,
    tier1: DashMap<String, ResolutionResult>,
    tier2: Option<Box<dyn CacheStore>>,
    stats: CacheStats,
}

impl ResolutionCache {
    pub fn new(enabled: bool, ttl: Duration, tier2: Option<Box<dyn CacheStore>>) -> Self {
        Self {
            enabled,
            ttl,
            tier1: DashMap::new(),
            tier2,
            stats: CacheStats::default(),
        }
    }

    /// Disabled cache that always computes.
    pub fn disabled() -> Self {
        Self::new(false, Duration::from_secs(0), None)
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Clear the process-local tier. The shared tier is left to expire.
    pub fn clear_local(&self) {
        self.tier1.clear();
    }

    /// Look up `key`, computing and storing on miss.
    ///
    /// Only `Ok` results are stored; errors pass straight through.
    pub fn get_or_compute<E>(
        &self,
        key: &str,
        compute: impl FnOnce() -> Result<ResolutionResult, E>,
    ) -> Result<ResolutionResult, E> {
        if !self.enabled {
            return compute();
        }

        self.stats.attempts.fetch_add(1, Ordering::Relaxed);

        if let Some(hit) = self.tier1.get(key) {
            self.stats.tier1_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit.value().clone());
        }

        if let Some(store) = &self.tier2 {
            if let Some(raw) = store.get(key) {
                match serde_json::from_str::<ResolutionResult>(&raw) {
                    Ok(result) => {
                        self.stats.tier2_hits.fetch_add(1, Ordering::Relaxed);
                        // Promote so the next lookup stays in-process.
                        self.tier1.insert(key.to_string(), result.clone());
                        return Ok(result);
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
                    }
                }
            }
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let result = compute()?;

        self.tier1.insert(key.to_string(), result.clone());
        if let Some(store) = &self.tier2 {
            match serde_json::to_string(&result) {
                Ok(raw) => store.put(key, raw, self.ttl),
                Err(e) => tracing::warn!(key = %key, error = %e, "failed to encode cache entry"),
            }
        }
        self.stats.stores.fetch_add(1, Ordering::Relaxed);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(pattern: &str) -> ResolutionResult {
        ResolutionResult {
            target_class: "app::controllers::UsersController".to_string(),
            method_name: "index".to_string(),
            source_pattern: pattern.to_string(),
        }
    }

    #[test]
    fn test_miss_then_tier1_hit() {
        let cache = ResolutionCache::new(true, Duration::from_secs(60), None);

        let first: Result<_, ()> = cache.get_or_compute("k", || Ok(result("users@index")));
        assert!(first.is_ok());
        let second: Result<_, ()> = cache.get_or_compute("k", || panic!("must not recompute"));
        assert_eq!(second.unwrap(), result("users@index"));

        let stats = cache.stats();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.tier1_hits, 1);
    }

    #[test]
    fn test_tier2_hit_promotes() {
        let store = InMemoryStore::new();
        store.put(
            "k",
            serde_json::to_string(&result("users@index")).unwrap(),
            Duration::from_secs(60),
        );
        let cache = ResolutionCache::new(true, Duration::from_secs(60), Some(Box::new(store)));

        let got: Result<_, ()> = cache.get_or_compute("k", || panic!("tier 2 should hit"));
        assert!(got.is_ok());
        assert_eq!(cache.stats().tier2_hits, 1);

        // Promoted: second lookup hits tier 1.
        let _: Result<_, ()> = cache.get_or_compute("k", || panic!("tier 1 should hit"));
        assert_eq!(cache.stats().tier1_hits, 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = ResolutionCache::new(true, Duration::from_secs(60), None);

        let failed: Result<ResolutionResult, &str> = cache.get_or_compute("k", || Err("boom"));
        assert!(failed.is_err());

        // Retry recomputes and can now succeed.
        let ok: Result<_, &str> = cache.get_or_compute("k", || Ok(result("users@index")));
        assert!(ok.is_ok());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_expired_tier2_entry_is_dropped() {
        let store = InMemoryStore::new();
        store.put("k", "{}".to_string(), Duration::from_secs(0));
        assert!(store.get("k").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_disabled_cache_always_computes() {
        let cache = ResolutionCache::disabled();
        let mut calls = 0;
        for _ in 0..2 {
            let _: Result<_, ()> = cache.get_or_compute("k", || {
                calls += 1;
                Ok(result("users@index"))
            });
        }
        assert_eq!(calls, 2);
        assert_eq!(cache.stats().attempts, 0);
    }

    #[test]
    fn test_clear_local_forces_tier2_or_recompute() {
        let cache = ResolutionCache::new(true, Duration::from_secs(60), None);
        let _: Result<_, ()> = cache.get_or_compute("k", || Ok(result("users@index")));
        cache.clear_local();
        let mut recomputed = false;
        let _: Result<_, ()> = cache.get_or_compute("k", || {
            recomputed = true;
            Ok(result("users@index"))
        });
        assert!(recomputed);
    }
}
