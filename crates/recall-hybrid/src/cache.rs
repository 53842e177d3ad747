//! Bounded LRU memo of answered queries, keyed by the normalized query text.
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use recall_core::text::normalize_query;

pub const DEFAULT_CAPACITY: usize = 30;

/// Thread-safe LRU keyed by [`normalize_query`]. Both `get` and `set` refresh
/// recency; inserting past capacity evicts the least recently used entry.
pub struct QueryCache<V> {
    inner: Mutex<LruCache<String, V>>,
}

impl<V: Clone> QueryCache<V> {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { inner: Mutex::new(LruCache::new(capacity)) }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, query: &str) -> Option<V> {
        self.lock().get(&normalize_query(query)).cloned()
    }

    pub fn set(&self, query: &str, value: V) {
        self.lock().put(normalize_query(query), value);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self { Self::new(DEFAULT_CAPACITY) }
}
