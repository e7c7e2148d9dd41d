//! Read-through caching registry.
//!
//! [`CachingRegistry`] answers from a [`TokenCache`] keyed by the canonical
//! SID string and falls back to a directory search on a miss.
//!
//! # Lookup Flow
//!
//! ```text
//! resolve(sid)
//!   │
//!   ├─ cache hit ──────────────► Some(dn) / None   (idle clock restarted)
//!   │
//!   └─ miss ─► directory.search
//!                ├─ Some(dn) ──► store, return
//!                ├─ None ──────► store only if cache_null_values, return
//!                └─ Err ───────► return Err, store nothing
//! ```
//!
//! Two callers missing on the same SID at the same time both search the
//! directory; the second store simply replaces the first.
//!
//! Stores and invalidations are serialized through a gate: a store checks
//! the invalidation generation and writes while holding it shared, and an
//! invalidation bumps the generation and evicts while holding it exclusively.
//! Once an invalidation returns, no answer fetched before it can reach the
//! cache.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use adtoken_sid::Sid;
use async_trait::async_trait;
use fail::fail_point;
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

use crate::{
    cache::{MokaTokenCache, TokenCache},
    config::RegistryConfig,
    directory::DirectoryResolver,
    error::{ConfigError, RegistryResult},
    metrics::{CacheMetrics, CacheMetricsSnapshot},
    registry::TokenGroupsRegistry,
    simple::SimpleRegistry,
    types::GroupDn,
};

/// A [`TokenGroupsRegistry`] that caches directory answers.
///
/// # Example
///
/// ```
/// use adtoken_registry::{CachingRegistry, MemoryDirectory, RegistryConfig, TokenGroupsRegistry};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let directory = MemoryDirectory::with_context_base("DC=example,DC=com");
/// directory.insert("CN=Users,CN=Builtin", "S-1-5-32-545".parse().unwrap());
///
/// let registry = CachingRegistry::builder()
///     .directory(directory)
///     .config(RegistryConfig::builder().cache_null_values(true).build().unwrap())
///     .build()
///     .unwrap();
///
/// let dn = registry.get_dn_from_sid_str("S-1-5-32-545").await.unwrap();
/// assert_eq!(dn.unwrap(), "CN=Users,CN=Builtin,DC=example,DC=com");
///
/// // Answered from the cache.
/// registry.get_dn_from_sid_str("S-1-5-32-545").await.unwrap();
/// assert_eq!(registry.metrics().hits, 1);
/// # });
/// ```
pub struct CachingRegistry {
    inner: SimpleRegistry,
    cache: Arc<dyn TokenCache>,
    cache_null_values: bool,
    metrics: CacheMetrics,
    /// Bumped by every invalidation. A miss whose directory search spans an
    /// invalidation returns its answer without storing it.
    invalidation_gen: AtomicU64,
    /// Held shared across a store's generation check and write, exclusively
    /// by invalidations.
    store_gate: RwLock<()>,
}

impl CachingRegistry {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> CachingRegistryBuilder {
        CachingRegistryBuilder::default()
    }

    /// Returns whether "not found" results are cached.
    #[must_use]
    pub fn cache_null_values(&self) -> bool {
        self.cache_null_values
    }

    /// Returns the cache handle.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn TokenCache> {
        &self.cache
    }

    /// Returns the current cache statistics.
    #[must_use]
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Returns the live metrics handle.
    #[must_use]
    pub fn metrics_handle(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Replaces the search base and drops every cached entry, since they
    /// were resolved under the old base.
    ///
    /// Takes `&mut self`: once the registry is shared behind an `Arc` its
    /// base can no longer change.
    pub fn set_base_dn(&mut self, base_dn: impl Into<String>) {
        let base_dn = base_dn.into();
        if base_dn == self.inner.base_dn() {
            return;
        }
        let evicted = self.cache.entry_count();
        self.inner.set_base_dn(base_dn);
        self.invalidation_gen.fetch_add(1, Ordering::Release);
        self.cache.clear();
        info!(
            audit.action = "clear_cache",
            audit.resource = "all_token_groups",
            audit.reason = "base_dn_changed",
            audit.result = "success",
            audit.evicted = evicted,
            base_dn = %self.inner.base_dn(),
            "audit_event"
        );
    }

    /// Drops the cached entry for `sid`, forcing the next lookup to search
    /// the directory.
    #[tracing::instrument(skip(self), fields(sid = %sid))]
    pub async fn invalidate(&self, sid: &Sid) {
        let _gate = self.store_gate.write().await;
        self.invalidation_gen.fetch_add(1, Ordering::Release);
        self.cache.remove(&sid.to_string()).await;
        self.metrics.record_invalidation();
        info!(
            audit.action = "invalidate_cache",
            audit.resource = %format_args!("sid:{sid}"),
            audit.result = "success",
            "audit_event"
        );
    }

    /// Drops every cached entry.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_all(&self) {
        let _gate = self.store_gate.write().await;
        let evicted = self.cache.entry_count();
        self.invalidation_gen.fetch_add(1, Ordering::Release);
        self.cache.clear();
        self.metrics.record_invalidation();
        info!(
            audit.action = "clear_cache",
            audit.resource = "all_token_groups",
            audit.result = "success",
            audit.evicted = evicted,
            "audit_event"
        );
    }

    async fn store(&self, key: String, resolved: &Option<GroupDn>, gen_before: u64) {
        if resolved.is_none() && !self.cache_null_values {
            trace!("negative caching disabled, not storing");
            return;
        }
        let _gate = self.store_gate.read().await;
        if self.invalidation_gen.load(Ordering::Acquire) != gen_before {
            debug!("discarding directory result: invalidation occurred during search");
            return;
        }
        self.cache.insert(key, resolved.clone()).await;
        self.metrics.record_store(resolved.is_none());
    }
}

impl fmt::Debug for CachingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingRegistry")
            .field("base_dn", &self.inner.base_dn())
            .field("cache_null_values", &self.cache_null_values)
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenGroupsRegistry for CachingRegistry {
    fn base_dn(&self) -> &str {
        self.inner.base_dn()
    }

    #[tracing::instrument(skip(self), fields(sid = %sid))]
    async fn resolve(&self, sid: &Sid) -> RegistryResult<Option<GroupDn>> {
        let key = sid.to_string();

        if let Some(cached) = self.cache.get(&key).await {
            self.metrics.record_hit(cached.is_none());
            debug!(cache = "hit", negative = cached.is_none(), "token group cache hit");
            return Ok(cached);
        }
        self.metrics.record_miss();
        debug!(cache = "miss", "token group cache miss");

        let gen_before = self.invalidation_gen.load(Ordering::Acquire);

        fail_point!("registry-before-directory-search", |_| {
            Err(crate::error::RegistryError::Directory(crate::error::DirectoryError::internal(
                "injected failure before directory search",
            )))
        });

        self.metrics.record_directory_call();
        let resolved = match self.inner.resolve(sid).await {
            Ok(resolved) => resolved,
            Err(err) => {
                self.metrics.record_directory_error();
                return Err(err);
            },
        };

        self.store(key, &resolved, gen_before).await;
        Ok(resolved)
    }
}

/// Builder for [`CachingRegistry`].
#[derive(Default)]
pub struct CachingRegistryBuilder {
    directory: Option<Arc<dyn DirectoryResolver>>,
    config: RegistryConfig,
    cache: Option<Arc<dyn TokenCache>>,
    metrics: Option<CacheMetrics>,
}

impl CachingRegistryBuilder {
    /// Sets the directory to search.
    #[must_use]
    pub fn directory(mut self, directory: impl DirectoryResolver + 'static) -> Self {
        self.directory = Some(Arc::new(directory));
        self
    }

    /// Sets the directory from an already shared handle.
    #[must_use]
    pub fn shared_directory(mut self, directory: Arc<dyn DirectoryResolver>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Sets the configuration (default: [`RegistryConfig::default`]).
    #[must_use]
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Injects the cache. Without one, a [`MokaTokenCache`] is built from the
    /// configuration's expiry policy and capacity.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Shares an existing metrics handle instead of creating one.
    #[must_use]
    pub fn metrics(mut self, metrics: CacheMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - no directory was supplied
    /// - the configuration fails [`RegistryConfig::validate`]
    pub fn build(self) -> Result<CachingRegistry, ConfigError> {
        let directory = self.directory.ok_or(ConfigError::Missing { field: "directory" })?;
        self.config.validate()?;

        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(MokaTokenCache::new(self.config.expiry_policy(), self.config.max_capacity()))
        });

        Ok(CachingRegistry {
            inner: SimpleRegistry::new(directory, self.config.base_dn()),
            cache,
            cache_null_values: self.config.cache_null_values(),
            metrics: self.metrics.unwrap_or_default(),
            invalidation_gen: AtomicU64::new(0),
            store_gate: RwLock::new(()),
        })
    }
}
