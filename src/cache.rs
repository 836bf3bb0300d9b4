//! Best-effort cache in front of the mapping store
//!
//! The cache accelerates the resolve path and is never a source of truth:
//! an entry may be absent, stale-but-valid, or evicted at any moment, and
//! every miss falls back to the store. The engine treats a cache error and a
//! cache miss identically, so implementations are free to fail.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::CacheError;

/// Key/value accelerator with SET-EX / GET-with-nil-on-miss semantics.
pub trait UrlCache: Send + Sync {
    /// Looks up a code. `Ok(None)` is a miss; an `Err` is treated as a miss
    /// by callers.
    fn get(&self, code: &str) -> Result<Option<String>, CacheError>;

    /// Stores a code -> URL binding that expires after `ttl`.
    fn set(&self, code: &str, url: &str, ttl: Duration) -> Result<(), CacheError>;
}

struct Entry {
    url: String,
    expires_at: Instant,
}

/// In-process TTL cache backed by a DashMap, so reads are concurrent without
/// an outer lock. Expired entries are dropped lazily on lookup.
pub struct TtlCache {
    inner: DashMap<String, Entry>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Number of entries currently held, counting not-yet-evicted expired
    /// ones. Test helper.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlCache for TtlCache {
    fn get(&self, code: &str) -> Result<Option<String>, CacheError> {
        if let Some(entry) = self.inner.get(code) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.url.clone()));
            }
        }
        // Reap the expired entry so it stops occupying a slot.
        self.inner.remove_if(code, |_, entry| entry.expires_at <= Instant::now());
        Ok(None)
    }

    fn set(&self, code: &str, url: &str, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(
            code.to_string(),
            Entry {
                url: url.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
