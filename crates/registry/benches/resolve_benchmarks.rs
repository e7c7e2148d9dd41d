//! Lookup throughput for the caching registry.

#![allow(clippy::expect_used)]

use std::{hint::black_box, sync::Arc, time::Duration};

use adtoken_registry::{
    CachingRegistry, ExpiryPolicy, MemoryDirectory, MemoryTokenCache, MokaTokenCache,
    RegistryConfig, SimpleRegistry, TokenCache, TokenGroupsRegistry, testutil::domain_sid,
};
use criterion::{Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

const DOMAIN: [u32; 3] = [21_000, 42_000, 63_000];
const GROUPS: u32 = 500;

fn directory() -> MemoryDirectory {
    let directory = MemoryDirectory::with_context_base("DC=bench,DC=local");
    for rid in 0..GROUPS {
        directory.insert(format!("CN=Group {rid},OU=Groups"), domain_sid(DOMAIN, 1000 + rid));
    }
    directory
}

fn caching(cache: Arc<dyn TokenCache>) -> CachingRegistry {
    CachingRegistry::builder()
        .directory(directory())
        .config(
            RegistryConfig::builder().max_capacity(u64::from(GROUPS)).build().expect("config"),
        )
        .cache(cache)
        .build()
        .expect("registry")
}

fn bench_resolve(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let policy = ExpiryPolicy::new(Duration::from_secs(3600), Duration::from_secs(3600));
    let tokens: Vec<Vec<u8>> =
        (0..GROUPS).map(|rid| domain_sid(DOMAIN, 1000 + rid).encode()).collect();

    let mut group = c.benchmark_group("resolve");

    let simple = SimpleRegistry::builder().directory(directory()).build().expect("registry");
    group.bench_function("uncached", |b| {
        b.to_async(&rt).iter(|| async {
            simple.get_dn_from_sid(black_box(&tokens[250])).await.expect("lookup")
        });
    });

    let providers: [(&str, Arc<dyn TokenCache>); 2] = [
        ("moka_hit", Arc::new(MokaTokenCache::new(policy, u64::from(GROUPS)))),
        ("memory_hit", Arc::new(MemoryTokenCache::new(policy, u64::from(GROUPS)))),
    ];
    for (name, cache) in providers {
        let registry = caching(cache);
        rt.block_on(async {
            for token in &tokens {
                registry.get_dn_from_sid(token).await.expect("warm");
            }
        });
        let registry = &registry;
        let tokens = &tokens;
        group.bench_function(name, |b| {
            let mut i = 0;
            b.to_async(&rt).iter(move || {
                i = (i + 1) % tokens.len();
                let token = &tokens[i];
                async move { registry.get_dn_from_sid(black_box(token)).await.expect("lookup") }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
