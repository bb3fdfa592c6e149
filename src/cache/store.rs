//! In-memory response cache with per-entry TTL
//!
//! Provides a `ResponseCache` handle that is created once at startup and cloned
//! into every call site. Clones share the same underlying map.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// A single stored response
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// The cached value
    value: V,
    /// Monotonic time the entry was written, drives freshness
    stored_at: Instant,
    /// Wall-clock time the entry was written
    cached_at: DateTime<Utc>,
    /// How long the entry stays fresh
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// Result of a stale-tolerant read, including metadata about freshness
#[derive(Debug, Clone, PartialEq)]
pub struct CachedData<V> {
    /// The cached value
    pub data: V,
    /// When the value was originally cached
    pub cached_at: DateTime<Utc>,
    /// Whether the entry has outlived its TTL
    pub is_expired: bool,
}

/// Process-wide response cache
///
/// Unbounded map from key to entry. Expired entries are not swept in the
/// background; `get` ignores them and the next `set` on the same key replaces them.
#[derive(Debug)]
pub struct ResponseCache<V = serde_json::Value> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<V>>>>,
}

impl<V> Clone for ResponseCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a cache key from a request URL and an optional discriminator
/// (for example serialized query parameters).
pub fn cache_key(url: &str, discriminator: Option<&str>) -> String {
    match discriminator {
        Some(extra) if !extra.is_empty() => format!("{}?{}", url, extra),
        _ => url.to_string(),
    }
}

impl<V> ResponseCache<V> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // A panic while holding the lock cannot leave a half-written entry behind,
    // so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value` under `key`, overwriting any previous entry and resetting its age
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            cached_at: Utc::now(),
            ttl,
        };
        self.lock().insert(key.to_string(), entry);
    }

    /// Removes entries and returns how many were dropped
    ///
    /// With no pattern every entry is removed. With a pattern, every entry whose key
    /// contains it as a plain substring is removed.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        match pattern {
            None => entries.clear(),
            Some(pattern) => entries.retain(|key, _| !key.contains(pattern)),
        }
        let removed = before - entries.len();
        tracing::info!(pattern = ?pattern, removed, "cache invalidated");
        removed
    }

    /// Drops every entry that has outlived its TTL
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    /// Returns true if a fresh entry exists for `key`
    pub fn contains_fresh(&self, key: &str) -> bool {
        let now = Instant::now();
        self.lock().get(key).is_some_and(|entry| entry.is_fresh(now))
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<V: Clone> ResponseCache<V> {
    /// Returns the value for `key` if present and still fresh
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.lock()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    /// Returns the entry for `key` regardless of age
    ///
    /// Expired entries come back with `is_expired = true`, which lets callers degrade
    /// gracefully when a live fetch fails.
    pub fn get_stale(&self, key: &str) -> Option<CachedData<V>> {
        let now = Instant::now();
        self.lock().get(key).map(|entry| CachedData {
            data: entry.value.clone(),
            cached_at: entry.cached_at,
            is_expired: !entry.is_fresh(now),
        })
    }
}
