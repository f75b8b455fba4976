//! Sharded shared cache (spec §4.8): a fixed-shard-count map from key to
//! value, each shard behind its own mutex, used for cross-worker caches
//! (e.g. a shared memoization table in the auto/batch drivers). Self-disables
//! under memory pressure or on emplace failure and never reports stale data
//! once disabled — a disabled shard simply stops accepting inserts and every
//! lookup misses.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::governor::MemoryGovernor;

const DEFAULT_SHARD_COUNT: usize = 16;

struct Shard<K, V> {
    map: Mutex<HashMap<K, V>>,
    disabled: AtomicBool,
}

/// A sharded, best-effort, self-disabling cache.
pub struct ShardedCache<K, V> {
    shards: Vec<Shard<K, V>>,
}

impl<K, V> Default for ShardedCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_SHARD_COUNT)
    }
}

impl<K, V> ShardedCache<K, V> {
    /// Build a cache with exactly `shard_count` shards (minimum 1).
    #[must_use]
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shards.push(Shard {
                map: Mutex::new(HashMap::new()),
                disabled: AtomicBool::new(false),
            });
        }
        Self { shards }
    }
}

impl<K: Hash + Eq + Clone, V: Clone> ShardedCache<K, V> {
    fn shard_index(&self, key: &K) -> usize {
        use std::hash::Hasher;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    /// Look up `key`. `None` both on a genuine miss and on a disabled shard.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let shard = &self.shards[self.shard_index(key)];
        if shard.disabled.load(Ordering::Relaxed) {
            return None;
        }
        shard.map.lock().ok()?.get(key).cloned()
    }

    /// Insert `key -> value`, unless the governor reports pressure or this
    /// shard has already self-disabled, in which case the insert is
    /// silently dropped (spec: "under pressure or on emplace OOM, the cache
    /// self-disables for the rest of the run").
    pub fn insert(&self, key: K, value: V, governor: &MemoryGovernor) {
        let shard = &self.shards[self.shard_index(&key)];
        if shard.disabled.load(Ordering::Relaxed) {
            return;
        }
        if governor.under_pressure() {
            shard.disabled.store(true, Ordering::Relaxed);
            return;
        }
        let Ok(mut map) = shard.map.lock() else {
            shard.disabled.store(true, Ordering::Relaxed);
            return;
        };
        map.insert(key, value);
    }

    /// Whether every shard has self-disabled.
    #[must_use]
    pub fn is_fully_disabled(&self) -> bool {
        self.shards
            .iter()
            .all(|s| s.disabled.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_roundtrips() {
        let cache: ShardedCache<u64, u32> = ShardedCache::default();
        let gov = MemoryGovernor::default();
        cache.insert(42, 7, &gov);
        assert_eq!(cache.get(&42), Some(7));
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn pressure_disables_the_touched_shard() {
        let cache: ShardedCache<u64, u32> = ShardedCache::new(1);
        let gov = MemoryGovernor::default();
        gov.enable(1_000_000);
        let bounded = super::super::bounded_resource::BoundedResource::default();
        gov.update_from_system_sample(0, &bounded);
        assert!(gov.under_pressure());
        cache.insert(1, 1, &gov);
        assert!(cache.is_fully_disabled());
        assert_eq!(cache.get(&1), None);
    }
}
