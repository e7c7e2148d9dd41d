//! Counters for the caching registry.
//!
//! All counters are lock-free atomics updated with `Relaxed` ordering: they
//! are statistics, not synchronization.
//!
//! # Example
//!
//! ```
//! use adtoken_registry::CacheMetrics;
//!
//! let metrics = CacheMetrics::new();
//! metrics.record_hit(true);
//! metrics.record_hit(false);
//! metrics.record_miss();
//! metrics.record_miss();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.hits, 2);
//! assert_eq!(snapshot.negative_hits, 1);
//! assert_eq!(snapshot.hit_rate(), 0.5);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tracing::info;

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    negative_hits: AtomicU64,
    misses: AtomicU64,
    directory_calls: AtomicU64,
    directory_errors: AtomicU64,
    stores: AtomicU64,
    negative_stores: AtomicU64,
    invalidations: AtomicU64,
}

/// Cache statistics shared by clones.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    inner: Arc<Counters>,
}

/// Point-in-time copy of [`CacheMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheMetricsSnapshot {
    /// Lookups answered from the cache, negative hits included.
    pub hits: u64,
    /// Hits on a cached "not found".
    pub negative_hits: u64,
    /// Lookups that found no live entry.
    pub misses: u64,
    /// Directory searches issued.
    pub directory_calls: u64,
    /// Directory searches that failed.
    pub directory_errors: u64,
    /// Entries written, negative ones included.
    pub stores: u64,
    /// "Not found" entries written.
    pub negative_stores: u64,
    /// Explicit invalidations, single-key and full.
    pub invalidations: u64,
}

impl CacheMetricsSnapshot {
    /// Returns the cache hit rate (0.0 - 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

impl CacheMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a cache hit; `negative` when the cached value is "not found".
    pub fn record_hit(&self, negative: bool) {
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
        if negative {
            self.inner.negative_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a cache miss.
    pub fn record_miss(&self) {
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a directory search.
    pub fn record_directory_call(&self) {
        self.inner.directory_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed directory search.
    pub fn record_directory_error(&self) {
        self.inner.directory_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cache write; `negative` when storing "not found".
    pub fn record_store(&self, negative: bool) {
        self.inner.stores.fetch_add(1, Ordering::Relaxed);
        if negative {
            self.inner.negative_stores.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records an explicit invalidation.
    pub fn record_invalidation(&self) {
        self.inner.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        let c = &self.inner;
        CacheMetricsSnapshot {
            hits: c.hits.load(Ordering::Relaxed),
            negative_hits: c.negative_hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            directory_calls: c.directory_calls.load(Ordering::Relaxed),
            directory_errors: c.directory_errors.load(Ordering::Relaxed),
            stores: c.stores.load(Ordering::Relaxed),
            negative_stores: c.negative_stores.load(Ordering::Relaxed),
            invalidations: c.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        let c = &self.inner;
        for counter in [
            &c.hits,
            &c.negative_hits,
            &c.misses,
            &c.directory_calls,
            &c.directory_errors,
            &c.stores,
            &c.negative_stores,
            &c.invalidations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Emits the current counters as a single `info` event.
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            hits = snapshot.hits,
            negative_hits = snapshot.negative_hits,
            misses = snapshot.misses,
            directory_calls = snapshot.directory_calls,
            directory_errors = snapshot.directory_errors,
            stores = snapshot.stores,
            hit_rate = snapshot.hit_rate(),
            "token group cache metrics"
        );
    }
}
