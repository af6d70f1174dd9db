//! Process-lifetime memoization of lookup results
//!
//! Entries are keyed by the exact lookup input and are never invalidated;
//! they live until the process exits or `clear` is called. Only successful
//! lookups are stored, so a transient outage is retried on the next call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{AddressResolver, Coordinates, YieldEstimator, YieldRequest};

/// Hit/miss counters for a cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Shared bookkeeping of both cache flavours
#[derive(Debug)]
struct Memo<K, V> {
    entries: Mutex<HashMap<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: std::hash::Hash + Eq, V: Copy> Memo<K, V> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, V>> {
        // The map holds plain values, so a panic elsewhere cannot leave it half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached value, or the result of `fetch` (stored when `Some`)
    fn get_or_fetch(&self, key: K, fetch: impl FnOnce() -> Option<V>) -> Option<V> {
        if let Some(value) = self.lock().get(&key).copied() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("lookup cache hit");
            return Some(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // Not holding the lock while the remote call runs
        let value = fetch()?;
        self.lock().insert(key, value);
        Some(value)
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }

    fn clear(&self) {
        self.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Memoizing wrapper around an [`AddressResolver`]
#[derive(Debug)]
pub struct CachedResolver<R> {
    inner: R,
    memo: Memo<String, Coordinates>,
}

impl<R: AddressResolver> CachedResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            memo: Memo::new(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.memo.stats()
    }

    pub fn clear(&self) {
        self.memo.clear();
    }
}

impl<R: AddressResolver> AddressResolver for CachedResolver<R> {
    fn resolve(&self, address: &str) -> Option<Coordinates> {
        self.memo
            .get_or_fetch(address.to_string(), || self.inner.resolve(address))
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.stats())
    }
}

/// Bit-exact key of a yield request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct YieldKey([u64; 6]);

impl From<&YieldRequest> for YieldKey {
    fn from(r: &YieldRequest) -> Self {
        YieldKey([
            r.coordinates.lat.to_bits(),
            r.coordinates.lon.to_bits(),
            r.kwp.to_bits(),
            r.geometry.tilt_deg.to_bits(),
            r.geometry.azimuth_deg.to_bits(),
            r.system_loss_pct.to_bits(),
        ])
    }
}

/// Memoizing wrapper around a [`YieldEstimator`]
#[derive(Debug)]
pub struct CachedEstimator<E> {
    inner: E,
    memo: Memo<YieldKey, f64>,
}

impl<E: YieldEstimator> CachedEstimator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            memo: Memo::new(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.memo.stats()
    }

    pub fn clear(&self) {
        self.memo.clear();
    }
}

impl<E: YieldEstimator> YieldEstimator for CachedEstimator<E> {
    fn estimate(&self, request: &YieldRequest) -> Option<f64> {
        self.memo
            .get_or_fetch(YieldKey::from(request), || self.inner.estimate(request))
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.stats())
    }
}
