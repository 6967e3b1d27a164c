//! Capacity-bounded least-recently-used map.
//!
//! Backed by an insertion-ordered `IndexMap`: the front is the least recently
//! used entry, the back the most recent. Not synchronized; the owner wraps it
//! in a lock.

use indexmap::IndexMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    entries: IndexMap<K, V>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: IndexMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let index = self.entries.get_index_of(key)?;
        let last = self.entries.len() - 1;
        self.entries.move_index(index, last);
        self.entries.get_index(last).map(|(_, v)| v)
    }

    /// Returns the entry without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Inserts or replaces an entry as most recently used.
    ///
    /// Returns the evicted entry if capacity was exceeded.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        let (index, replaced) = self.entries.insert_full(key, value);
        if replaced.is_some() {
            let last = self.entries.len() - 1;
            self.entries.move_index(index, last);
            return None;
        }
        if self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0)
        } else {
            None
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}
