//! Keyed stores for resolved groups.
//!
//! The caching registry talks to its store through [`TokenCache`], keyed by
//! the canonical SID string. Two providers ship with the crate:
//!
//! | Provider | Backing | Expiry |
//! |----------|---------|--------|
//! | [`MokaTokenCache`] | `moka::future::Cache` | per-entry, evaluated by moka |
//! | [`MemoryTokenCache`] | `HashMap` behind a mutex | lazy on access, optional sweep |
//!
//! Both apply the same [`ExpiryPolicy`] and evict once `max_capacity`
//! entries are held.

mod expiry;
mod memory;
mod moka_store;

use async_trait::async_trait;
pub use expiry::{CacheEntry, ExpiryPolicy};
pub use memory::MemoryTokenCache;
pub use moka_store::MokaTokenCache;

use crate::types::GroupDn;

/// What the cache remembers for a SID: `Some(dn)` for a group, `None` for a
/// remembered "not found".
pub type CachedGroup = Option<GroupDn>;

/// A keyed store with created/accessed expiry.
///
/// Implementations must be safe to share between tasks; single-entry reads
/// and writes are atomic.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Returns the live entry for `key` and restarts its idle clock.
    ///
    /// The outer `None` means there is no live entry; `Some(None)` is a
    /// cached "not found".
    async fn get(&self, key: &str) -> Option<CachedGroup>;

    /// Stores `value` under `key`, replacing any previous entry and
    /// restarting both expiry clocks.
    async fn insert(&self, key: String, value: CachedGroup);

    /// Drops the entry for `key`, if any.
    async fn remove(&self, key: &str);

    /// Drops every entry.
    fn clear(&self);

    /// Approximate number of entries held, expired ones included until they
    /// are evicted.
    fn entry_count(&self) -> u64;
}
