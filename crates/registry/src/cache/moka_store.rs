//! [`moka`]-backed provider.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{future::Cache, policy::EvictionPolicy};

use super::{CachedGroup, ExpiryPolicy, TokenCache};

/// Maps the created/accessed policy onto moka's per-entry expiry hooks.
struct CreatedAccessedExpiry {
    policy: ExpiryPolicy,
}

impl moka::Expiry<String, CachedGroup> for CreatedAccessedExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        _value: &CachedGroup,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.policy.after_create())
    }

    fn expire_after_read(
        &self,
        _key: &String,
        _value: &CachedGroup,
        read_at: Instant,
        _duration_until_expiry: Option<Duration>,
        last_modified_at: Instant,
    ) -> Option<Duration> {
        Some(self.policy.after_read(last_modified_at, read_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        _value: &CachedGroup,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(self.policy.after_create())
    }
}

/// [`TokenCache`] backed by a [`moka::future::Cache`].
///
/// Capacity is enforced with LRU eviction, and a `max_capacity` of zero is
/// raised to one as in [`MemoryTokenCache`](super::MemoryTokenCache). Moka applies evictions and
/// expirations in batches, so [`entry_count`](TokenCache::entry_count) can
/// lag behind; call [`run_pending_tasks`](Self::run_pending_tasks) first
/// when an exact figure matters.
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct MokaTokenCache {
    cache: Cache<String, CachedGroup>,
    policy: ExpiryPolicy,
}

impl MokaTokenCache {
    /// Creates a cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(policy: ExpiryPolicy, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .name("token-groups")
            .max_capacity(max_capacity.max(1))
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(CreatedAccessedExpiry { policy })
            .build();
        Self { cache, policy }
    }

    /// Returns the expiry policy applied to entries.
    #[must_use]
    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// Applies pending evictions and expirations.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl TokenCache for MokaTokenCache {
    async fn get(&self, key: &str) -> Option<CachedGroup> {
        self.cache.get(key).await
    }

    async fn insert(&self, key: String, value: CachedGroup) {
        self.cache.insert(key, value).await;
    }

    async fn remove(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    fn clear(&self) {
        self.cache.invalidate_all();
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
