//! Criterion benchmarks for the Falcata matching core.
//!
//! Covers the two hot paths exercised on every candidate during a match:
//! - Collapser routing over streams with varying key cardinality
//! - Value access through the shard-backed value stream document

use std::sync::Arc;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use falcata::hit::{Hit, SortOrder};
use falcata::matcher::{CollapseConfig, Collapser, ValueStreamDocument};
use falcata::shard;
use falcata::storage::{MemoryShard, ShardReader};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const KEY_SLOT: u32 = 0;

/// Generate `(doc_id, weight, key)` candidate streams for benchmarking.
fn generate_candidates(count: usize, distinct_keys: usize) -> Vec<(u64, f64, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..count)
        .map(|i| {
            let key = format!("key-{}", rng.random_range(0..distinct_keys));
            (i as u64, rng.random::<f64>() * 100.0, key.into_bytes())
        })
        .collect()
}

/// Build a sharded store holding the candidates' collapse keys.
fn build_store(
    candidates: &[(u64, f64, Vec<u8>)],
    shard_count: usize,
) -> Vec<Arc<dyn ShardReader>> {
    let shards: Vec<MemoryShard> = (0..shard_count).map(|_| MemoryShard::new()).collect();
    for (doc_id, _, key) in candidates {
        let (shard_index, local_id) = shard::split(*doc_id, shard_count);
        shards[shard_index].set_value(local_id, KEY_SLOT, key.clone());
    }
    shards
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn ShardReader>)
        .collect()
}

/// Benchmark collapser routing with pre-resolved keys.
fn bench_collapser(c: &mut Criterion) {
    let mut group = c.benchmark_group("collapser");

    let candidates = generate_candidates(10_000, 100);
    let order = SortOrder::Relevance;
    let shards = build_store(&[], 1);

    for collapse_max in [1usize, 4] {
        group.throughput(Throughput::Elements(candidates.len() as u64));
        group.bench_function(format!("process_10k_max{collapse_max}"), |b| {
            b.iter(|| {
                let mut collapser =
                    Collapser::new(CollapseConfig::new(KEY_SLOT, collapse_max));
                let mut view = ValueStreamDocument::new(&shards);
                for (doc_id, weight, key) in &candidates {
                    let mut hit = Hit::new(*doc_id, *weight);
                    let outcome = collapser
                        .process(&mut hit, Some(key), &mut view, &order)
                        .unwrap();
                    black_box(outcome);
                }
                black_box(collapser.matches_lower_bound())
            })
        });
    }

    group.finish();
}

/// Benchmark the full path: key fetch through the value stream, then route.
fn bench_value_stream_collapse(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_stream");

    let candidates = generate_candidates(10_000, 100);
    let shard_count = 4;
    let shards = build_store(&candidates, shard_count);
    let order = SortOrder::Relevance;

    // Visit shard by shard, the way an engine walks a partitioned match.
    let mut ordered = candidates.clone();
    ordered.sort_by_key(|(doc_id, _, _)| shard::split(*doc_id, shard_count));

    group.throughput(Throughput::Elements(ordered.len() as u64));
    group.bench_function("fetch_key_and_process_10k", |b| {
        b.iter(|| {
            let mut collapser = Collapser::new(CollapseConfig::new(KEY_SLOT, 1));
            let mut view = ValueStreamDocument::new(&shards);
            for (doc_id, weight, _) in &ordered {
                let shard_index = shard::shard_of(*doc_id, shard_count);
                if shard_index != view.current_shard() {
                    view.switch_shard(shard_index);
                }
                view.set_document(*doc_id);
                let mut hit = Hit::new(*doc_id, *weight);
                let outcome = collapser.process(&mut hit, None, &mut view, &order).unwrap();
                black_box(outcome);
            }
            black_box(collapser.stats())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_collapser, bench_value_stream_collapse);
criterion_main!(benches);
