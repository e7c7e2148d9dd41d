#![allow(clippy::expect_used)]

use std::hint::black_box;

use adtoken_sid::Sid;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Builds a domain-style SID with `count` sub-authorities.
fn make_sid(count: usize) -> Sid {
    let subs = (0..count as u32).map(|i| 1_000_000 + i).collect();
    Sid::new(1, 5, subs).expect("valid SID")
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for count in [1usize, 5, 15] {
        let bytes = make_sid(count).encode();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &bytes, |b, bytes| {
            b.iter(|| Sid::decode(black_box(bytes)).expect("decodes"));
        });
    }
    group.finish();
}

fn bench_canonical_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonical_string");
    for count in [1usize, 5, 15] {
        let sid = make_sid(count);
        let text = sid.to_string();
        group.bench_with_input(BenchmarkId::new("format", count), &sid, |b, sid| {
            b.iter(|| black_box(sid).to_string());
        });
        group.bench_with_input(BenchmarkId::new("parse", count), &text, |b, text| {
            b.iter(|| black_box(text.as_str()).parse::<Sid>().expect("parses"));
        });
    }
    group.finish();
}

fn bench_cache_key(c: &mut Criterion) {
    // The caching registry derives its key as decode + format on every call.
    let bytes = make_sid(5).encode();
    c.bench_function("cache_key_from_token", |b| {
        b.iter(|| Sid::decode(black_box(&bytes)).expect("decodes").to_string());
    });
}

criterion_group!(benches, bench_decode, bench_canonical_string, bench_cache_key);
criterion_main!(benches);
