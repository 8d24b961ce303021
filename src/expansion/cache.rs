//! Memoization caches for index-set bookkeeping.
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

/// Process-owned, concurrency-safe key-value store for memoizing
/// deterministic index computations.
///
/// Entries are immutable once inserted and shared behind an [`Arc`]. Two
/// threads racing on the same miss each compute the same deterministic value;
/// the first insert wins and the loser's copy is dropped.
pub struct MemoCache<K, V> {
    map: RwLock<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash + Clone, V> MemoCache<K, V> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Look up `key`, computing and inserting the value on a miss.
    pub fn get_or_compute(&self, key: &K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some(value) = self.map.read().unwrap().get(key) {
            return Arc::clone(value);
        }
        let value = Arc::new(compute());
        let mut map = self.map.write().unwrap();
        Arc::clone(map.entry(key.clone()).or_insert(value))
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.map.read().unwrap().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
