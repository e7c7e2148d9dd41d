//! Concurrent access tests for `CachingRegistry`.
//!
//! Many tasks share one registry and one cache. Same-key misses may each
//! reach the directory, but every caller must get the right answer and the
//! cache must end with one consistent entry per key.

#![allow(clippy::expect_used, clippy::panic)]

use std::{sync::Arc, time::Duration};

use adtoken_registry::{
    CachingRegistry, DirectoryError, ExpiryPolicy, GroupDn, MemoryTokenCache, MokaTokenCache,
    RegistryConfig, TokenCache, TokenGroupsRegistry,
    testutil::{CountingDirectory, domain_sid, sid},
};
use tokio::task::JoinSet;

/// Number of concurrent tasks for most tests.
const CONCURRENCY: usize = 32;

/// Number of distinct groups in the mixed workload.
const GROUPS: u32 = 20;

/// Lookups each task performs in the mixed workload.
const OPS_PER_TASK: usize = 200;

const DOMAIN: [u32; 3] = [1, 2, 3];

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn group_name(rid: u32) -> String {
    format!("CN=Group {rid},OU=Groups,DC=example,DC=com")
}

fn populated_directory() -> Arc<CountingDirectory> {
    let directory = Arc::new(CountingDirectory::new());
    for rid in 1000..1000 + GROUPS {
        directory.insert(group_name(rid), domain_sid(DOMAIN, rid));
    }
    directory
}

fn shared_registry(
    directory: &Arc<CountingDirectory>,
    cache: Arc<dyn TokenCache>,
    cache_null_values: bool,
) -> Arc<CachingRegistry> {
    let config = RegistryConfig::builder()
        .cache_null_values(cache_null_values)
        .build()
        .expect("valid config");
    Arc::new(
        CachingRegistry::builder()
            .shared_directory(directory.clone())
            .config(config)
            .cache(cache)
            .build()
            .expect("registry builds"),
    )
}

fn long_lived() -> ExpiryPolicy {
    ExpiryPolicy::new(Duration::from_secs(60), Duration::from_secs(60))
}

// ---------------------------------------------------------------------------
// Test: many callers, one uncached key
// ---------------------------------------------------------------------------

/// Every caller racing on a cold key gets the DN, and afterwards the cache
/// answers without the directory.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_on_one_key_agree() {
    let directory = populated_directory();
    directory.set_latency(Duration::from_millis(20));
    let cache = Arc::new(MokaTokenCache::new(long_lived(), 100));
    let registry = shared_registry(&directory, cache.clone(), false);
    let target = domain_sid(DOMAIN, 1005);

    let mut set = JoinSet::new();
    for _ in 0..CONCURRENCY {
        let registry = Arc::clone(&registry);
        let target = target.clone();
        set.spawn(async move { registry.resolve(&target).await });
    }

    while let Some(result) = set.join_next().await {
        let dn = result.expect("task should not panic").expect("lookup succeeds");
        assert_eq!(dn.expect("group exists"), group_name(1005).as_str());
    }

    let calls = directory.calls();
    assert!((1..=CONCURRENCY).contains(&calls), "unexpected call count {calls}");

    cache.run_pending_tasks().await;
    assert_eq!(cache.entry_count(), 1);
    let cached = cache.get(&target.to_string()).await.expect("entry present");
    assert_eq!(cached, Some(GroupDn::new(group_name(1005)).expect("non-empty")));

    registry.resolve(&target).await.expect("lookup succeeds");
    assert_eq!(directory.calls(), calls, "warm cache must not reach the directory");
}

// ---------------------------------------------------------------------------
// Test: mixed workload across keys and providers
// ---------------------------------------------------------------------------

async fn mixed_workload(cache: Arc<dyn TokenCache>) {
    let directory = populated_directory();
    let registry = shared_registry(&directory, cache, true);

    let mut set = JoinSet::new();
    for task_id in 0..CONCURRENCY {
        let registry = Arc::clone(&registry);
        set.spawn(async move {
            for i in 0..OPS_PER_TASK {
                // Every fifth RID is outside the populated range.
                let offset = ((task_id + i) % (GROUPS as usize + GROUPS as usize / 4)) as u32;
                let rid = 1000 + offset;
                let dn = registry.resolve(&domain_sid(DOMAIN, rid)).await.expect("lookup");
                if rid < 1000 + GROUPS {
                    assert_eq!(dn.expect("known group"), group_name(rid).as_str());
                } else {
                    assert!(dn.is_none(), "rid {rid} should be unknown");
                }
            }
        });
    }

    while let Some(result) = set.join_next().await {
        result.expect("task should not panic");
    }

    let snapshot = registry.metrics();
    let total = (CONCURRENCY * OPS_PER_TASK) as u64;
    assert_eq!(snapshot.hits + snapshot.misses, total);
    assert_eq!(snapshot.directory_calls as usize, directory.calls());
    assert!(snapshot.hits > snapshot.misses, "cache should absorb most lookups");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_workload_moka() {
    mixed_workload(Arc::new(MokaTokenCache::new(long_lived(), 100))).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_workload_memory() {
    mixed_workload(Arc::new(MemoryTokenCache::new(long_lived(), 100))).await;
}

// ---------------------------------------------------------------------------
// Test: failures under contention are never cached
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_directory_leaves_cache_empty() {
    let directory = populated_directory();
    directory.fail_always(DirectoryError::connection("directory unreachable"));
    let cache = Arc::new(MemoryTokenCache::new(long_lived(), 100));
    let registry = shared_registry(&directory, cache.clone(), true);

    let mut set = JoinSet::new();
    for task_id in 0..CONCURRENCY {
        let registry = Arc::clone(&registry);
        set.spawn(async move {
            let rid = 1000 + (task_id as u32 % GROUPS);
            registry.resolve(&domain_sid(DOMAIN, rid)).await
        });
    }

    while let Some(result) = set.join_next().await {
        let err = result.expect("task should not panic").expect_err("directory is down");
        assert!(err.is_transient());
    }
    assert_eq!(cache.entry_count(), 0);
    assert_eq!(directory.calls(), CONCURRENCY);

    directory.recover();
    let dn = registry.resolve(&sid("S-1-5-21-1-2-3-1000")).await.expect("recovered");
    assert_eq!(dn.expect("known group"), group_name(1000).as_str());
}

// ---------------------------------------------------------------------------
// Test: invalidation racing with lookups
// ---------------------------------------------------------------------------

/// A group renamed mid-run and then invalidated is never shadowed by an
/// answer fetched under its old name.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn invalidation_during_lookups_stays_consistent() {
    let directory = populated_directory();
    directory.set_latency(Duration::from_millis(1));
    let cache = Arc::new(MemoryTokenCache::new(long_lived(), 100));
    let registry = shared_registry(&directory, cache.clone(), false);
    let target = domain_sid(DOMAIN, 1010);
    let old_name = group_name(1010);
    let new_name = "CN=Renamed 1010,OU=Groups,DC=example,DC=com";

    let mut set = JoinSet::new();
    for _ in 0..CONCURRENCY / 2 {
        let registry = Arc::clone(&registry);
        let target = target.clone();
        let old_name = old_name.clone();
        set.spawn(async move {
            for _ in 0..20 {
                let dn = registry.resolve(&target).await.expect("lookup");
                let dn = dn.expect("known group");
                assert!(dn == old_name.as_str() || dn == new_name, "unexpected DN {dn}");
            }
        });
    }
    for _ in 0..4 {
        let registry = Arc::clone(&registry);
        let target = target.clone();
        set.spawn(async move {
            for _ in 0..10 {
                registry.invalidate(&target).await;
                tokio::task::yield_now().await;
            }
        });
    }
    {
        let registry = Arc::clone(&registry);
        let directory = Arc::clone(&directory);
        let target = target.clone();
        set.spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            directory.inner().remove(&target);
            directory.insert(new_name, target.clone());
            registry.invalidate(&target).await;
        });
    }

    while let Some(result) = set.join_next().await {
        result.expect("task should not panic");
    }

    if let Some(cached) = cache.get(&target.to_string()).await {
        assert_eq!(cached.expect("positive entry"), new_name);
    }
    let dn = registry.resolve(&target).await.expect("lookup");
    assert_eq!(dn.expect("known group"), new_name);
}
