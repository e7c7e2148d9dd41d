//! Mutex-guarded map provider with lazy expiry.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::{select, sync::watch, time::sleep};
use tracing::{debug, trace};

use super::{CacheEntry, CachedGroup, ExpiryPolicy, TokenCache};

type Entries = Mutex<HashMap<String, CacheEntry>>;

/// Holds the shutdown signal sender. When dropped, the watch channel
/// closes and the sweep task exits.
struct ShutdownGuard {
    shutdown_tx: watch::Sender<()>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// In-process [`TokenCache`] over a `HashMap`.
///
/// Expired entries are detected and dropped when they are read. Without a
/// sweep they otherwise linger until evicted for capacity; a sweep started
/// with [`with_sweep`](Self::with_sweep) purges them periodically.
///
/// When the cache is full, inserting a new key first purges expired entries
/// and then evicts the least recently accessed one. A `max_capacity` of zero
/// is raised to one.
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct MemoryTokenCache {
    entries: Arc<Entries>,
    policy: ExpiryPolicy,
    max_capacity: u64,
    shutdown_guard: Option<Arc<ShutdownGuard>>,
}

impl MemoryTokenCache {
    /// Creates a cache with lazy expiry only.
    #[must_use]
    pub fn new(policy: ExpiryPolicy, max_capacity: u64) -> Self {
        Self {
            entries: Arc::default(),
            policy,
            max_capacity: max_capacity.max(1),
            shutdown_guard: None,
        }
    }

    /// Creates a cache and spawns a task purging expired entries every
    /// `interval`.
    ///
    /// The task stops when every clone of the cache has been dropped or
    /// [`shutdown`](Self::shutdown) is called. Must be called from within a
    /// Tokio runtime.
    #[must_use]
    pub fn with_sweep(policy: ExpiryPolicy, max_capacity: u64, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let entries: Arc<Entries> = Arc::default();

        let weak = Arc::downgrade(&entries);
        tokio::spawn(async move {
            sweep_expired(weak, policy, interval, shutdown_rx).await;
        });

        Self {
            entries,
            policy,
            max_capacity: max_capacity.max(1),
            shutdown_guard: Some(Arc::new(ShutdownGuard { shutdown_tx })),
        }
    }

    /// Stops the background sweep, if one is running.
    pub fn shutdown(&self) {
        if let Some(guard) = &self.shutdown_guard {
            let _ = guard.shutdown_tx.send(());
        }
    }

    /// Returns the expiry policy applied to entries.
    #[must_use]
    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// Returns the maximum number of entries.
    #[must_use]
    pub fn max_capacity(&self) -> u64 {
        self.max_capacity
    }

    /// Drops every expired entry now, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        purge(&mut self.entries.lock(), &self.policy, Instant::now())
    }
}

fn purge(entries: &mut HashMap<String, CacheEntry>, policy: &ExpiryPolicy, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !policy.is_expired(entry, now));
    before - entries.len()
}

async fn sweep_expired(
    entries: Weak<Entries>,
    policy: ExpiryPolicy,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<()>,
) {
    loop {
        select! {
            _ = sleep(interval) => {}
            _ = shutdown_rx.changed() => {
                return;
            }
        }

        let Some(entries) = entries.upgrade() else {
            return;
        };
        let purged = purge(&mut entries.lock(), &policy, Instant::now());
        if purged > 0 {
            debug!(purged, "swept expired cache entries");
        }
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn get(&self, key: &str) -> Option<CachedGroup> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(key)?;
        if self.policy.is_expired(entry, now) {
            trace!(key, "dropping expired entry");
            entries.remove(key);
            return None;
        }
        entry.touch(now);
        Some(entry.value().clone())
    }

    async fn insert(&self, key: String, value: CachedGroup) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let capacity = usize::try_from(self.max_capacity).unwrap_or(usize::MAX);
        if !entries.contains_key(&key) && entries.len() >= capacity {
            purge(&mut entries, &self.policy, now);
            if entries.len() >= capacity
                && let Some(victim) = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_accessed_at())
                    .map(|(victim, _)| victim.clone())
            {
                trace!(key = %victim, "evicting least recently accessed entry");
                entries.remove(&victim);
            }
        }
        entries.insert(key, CacheEntry::new(value, now));
    }

    async fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn entry_count(&self) -> u64 {
        self.entries.lock().len() as u64
    }
}
