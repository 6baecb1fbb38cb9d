//! In-Memory Response Cache
//!
//! Thread-safe TTL cache for explorer responses, so a wallet touched by
//! both funding trees (or by several compared wallets) is fetched once.
//! Uses DashMap for concurrent access without lock contention.
//!
//! Keys are `action:address` with the address lowercased.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::utils::constants::{CACHE_CLEANUP_EVERY, DEFAULT_CACHE_TTL_SECS};

/// Cache entry with creation time for TTL validation
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl_secs: u64,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > Duration::from_secs(self.ttl_secs)
    }
}

/// TTL cache shared by clones
#[derive(Clone)]
pub struct ResponseCache<V> {
    store: Arc<DashMap<String, CacheEntry<V>>>,
    ttl_secs: u64,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    inserts: Arc<AtomicU64>,
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> ResponseCache<V> {
    /// Cache with the default TTL (5 minutes)
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL_SECS)
    }

    /// A TTL of 0 disables caching
    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl_secs,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            inserts: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn key(action: &str, address: &str) -> String {
        format!("{}:{}", action, address.to_lowercase())
    }

    /// Returns the value if present and not expired
    pub fn get(&self, action: &str, address: &str) -> Option<V> {
        let key = Self::key(action, address);

        if let Some(entry) = self.store.get(&key) {
            if entry.is_expired() {
                drop(entry);
                self.store.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (expired): {}", key);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("✅ CACHE HIT: {}", key);
                Some(entry.value.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Only successful responses should be stored
    pub fn set(&self, action: &str, address: &str, value: V) {
        if self.ttl_secs == 0 {
            return;
        }
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
            ttl_secs: self.ttl_secs,
        };
        self.store.insert(Self::key(action, address), entry);

        let inserted = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if inserted % CACHE_CLEANUP_EVERY == 0 {
            self.cleanup_expired();
        }
    }

    /// Drops expired entries and returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl_secs,
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}
