//! Sharding arithmetic for the horizontally partitioned document store.
//!
//! Global document ids are striped across shards round-robin: global id
//! `g` lives on shard `g % shard_count` as local id `g / shard_count`.
//! Both directions are pure and total over valid ids.

/// Return the `(shard_index, local_id)` pair for a global document id.
pub fn split(global_id: u64, shard_count: usize) -> (usize, u64) {
    debug_assert!(shard_count >= 1);
    let n = shard_count as u64;
    ((global_id % n) as usize, global_id / n)
}

/// Return the shard index a global document id lives on.
pub fn shard_of(global_id: u64, shard_count: usize) -> usize {
    split(global_id, shard_count).0
}

/// Return the shard-local id of a global document id.
pub fn local_id(global_id: u64, shard_count: usize) -> u64 {
    split(global_id, shard_count).1
}

/// Inverse of [`split`]: rebuild the global id from shard and local id.
pub fn join(shard_index: usize, local_id: u64, shard_count: usize) -> u64 {
    debug_assert!(shard_index < shard_count);
    local_id * shard_count as u64 + shard_index as u64
}
