//! Thread-safe LRU cache for analyzer results
//!
//! Reads take the shared lock and bump the entry's last-access stamp
//! atomically. Inserts take the exclusive lock; when the cache is full a
//! fraction of the least recently accessed entries is evicted in one sort,
//! so a burst of inserts pays for a single reshaping.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Default capacity for analyzer caches
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Capacity of the inheritance analyzer cache
pub const INHERITANCE_CACHE_SIZE: usize = 256;

/// Capacity of the discriminator analyzer cache
pub const DISCRIMINATOR_CACHE_SIZE: usize = 128;

/// Share of entries evicted when a full cache receives a new key
pub const DEFAULT_EVICTION_FRACTION: f64 = 0.2;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    last_access: AtomicU64,
}

/// Fixed-size cache evicting the least recently accessed entries
#[derive(Debug)]
pub struct LruCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    clock: AtomicU64,
    max_size: usize,
    eviction_fraction: f64,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache holding at most `max_size` entries (at least one)
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            max_size: max_size.max(1),
            eviction_fraction: DEFAULT_EVICTION_FRACTION,
        }
    }

    /// Set the share of entries evicted on overflow (clamped to `0.0..=1.0`)
    pub fn with_eviction_fraction(mut self, fraction: f64) -> Self {
        self.eviction_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of entries removed by one eviction round
    pub fn eviction_batch(&self) -> usize {
        ((self.max_size as f64 * self.eviction_fraction).ceil() as usize).max(1)
    }

    /// Look up a value, marking it as most recently used
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        entry.last_access.store(self.tick(), Ordering::Relaxed);
        Some(entry.value.clone())
    }

    /// Insert or replace a value
    pub fn insert(&self, key: K, value: V) {
        let stamp = self.tick();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(&key) && entries.len() >= self.max_size {
            let mut by_age: Vec<(u64, K)> = entries
                .iter()
                .map(|(k, e)| (e.last_access.load(Ordering::Relaxed), k.clone()))
                .collect();
            by_age.sort_by_key(|(stamp, _)| *stamp);
            for (_, old) in by_age.into_iter().take(self.eviction_batch()) {
                entries.remove(&old);
            }
        }
        entries.insert(
            key,
            Entry {
                value,
                last_access: AtomicU64::new(stamp),
            },
        );
    }

    /// Return the cached value or compute, store and return it
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<K, V> Default for LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}
