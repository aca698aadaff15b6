//! Specialized collection types
//!
//! Keyed caches with pluggable eviction, and a table of in-flight loads so
//! concurrent first requests for one key await a single shared future.

use std::collections::{HashMap, VecDeque};
use std::future::Future;

use futures::future::{FutureExt, LocalBoxFuture, Shared};

/// Decides which entries a [`KeyedCache`] drops
pub trait EvictionPolicy {
    /// Record a read hit for `key`
    fn record_access(&mut self, key: &str);

    /// Record an insertion for `key` and return the keys that must be evicted
    fn record_insert(&mut self, key: &str) -> Vec<String>;

    /// Forget `key` after an explicit removal
    fn record_removal(&mut self, key: &str);
}

/// Keeps every entry for the lifetime of the cache
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl EvictionPolicy for Unbounded {
    fn record_access(&mut self, _key: &str) {}

    fn record_insert(&mut self, _key: &str) -> Vec<String> {
        Vec::new()
    }

    fn record_removal(&mut self, _key: &str) {}
}

/// Evicts the least recently used entry once `capacity` is exceeded
#[derive(Debug, Clone)]
pub struct LeastRecentlyUsed {
    capacity: usize,
    order: VecDeque<String>,
}

impl LeastRecentlyUsed {
    /// Create a policy holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
        }
    }

    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.to_string());
    }
}

impl EvictionPolicy for LeastRecentlyUsed {
    fn record_access(&mut self, key: &str) {
        if self.order.iter().any(|k| k == key) {
            self.touch(key);
        }
    }

    fn record_insert(&mut self, key: &str) -> Vec<String> {
        self.touch(key);
        let mut evicted = Vec::new();
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    fn record_removal(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }
}

/// String-keyed cache that remembers insertion order
pub struct KeyedCache<V> {
    entries: HashMap<String, V>,
    insertion_order: Vec<String>,
    policy: Box<dyn EvictionPolicy>,
}

impl<V> KeyedCache<V> {
    /// Create an unbounded cache
    pub fn new() -> Self {
        Self::with_policy(Box::new(Unbounded))
    }

    /// Create a cache with a custom eviction policy
    pub fn with_policy(policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: Vec::new(),
            policy,
        }
    }

    /// Look up an entry, recording the access with the policy
    pub fn get(&mut self, key: &str) -> Option<&V> {
        if self.entries.contains_key(key) {
            self.policy.record_access(key);
        }
        self.entries.get(key)
    }

    /// Look up an entry without touching the eviction order
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Check whether `key` is cached
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert (or overwrite) an entry, returning the entries the policy evicted
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Vec<(String, V)> {
        let key = key.into();
        if self.entries.insert(key.clone(), value).is_none() {
            self.insertion_order.push(key.clone());
        }
        let mut evicted = Vec::new();
        for stale in self.policy.record_insert(&key) {
            if let Some(value) = self.entries.remove(&stale) {
                self.insertion_order.retain(|k| k != &stale);
                evicted.push((stale, value));
            }
        }
        evicted
    }

    /// Remove an entry
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.insertion_order.retain(|k| k != key);
            self.policy.record_removal(key);
        }
        removed
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.insertion_order.iter().map(String::as_str)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for KeyedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared future handed to every caller waiting on the same key
pub type SharedLoad<T> = Shared<LocalBoxFuture<'static, T>>;

/// Table of loads that have been started but not yet finished
pub struct InFlightLoads<T: Clone> {
    pending: HashMap<String, SharedLoad<T>>,
}

impl<T: Clone + 'static> InFlightLoads<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Return the pending load for `key`, starting it with `start` if none exists
    ///
    /// The returned flag is `true` when this call started the load.
    pub fn join_or_start<F, Fut>(&mut self, key: &str, start: F) -> (SharedLoad<T>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + 'static,
    {
        if let Some(existing) = self.pending.get(key) {
            return (existing.clone(), false);
        }
        let shared = start().boxed_local().shared();
        self.pending.insert(key.to_string(), shared.clone());
        (shared, true)
    }

    /// Drop the bookkeeping for a finished load
    ///
    /// The entry is only removed while it is still `load`; a newer load
    /// started for the same key after this one finished stays pending.
    pub fn finish(&mut self, key: &str, load: &SharedLoad<T>) {
        if self.pending.get(key).is_some_and(|pending| pending.ptr_eq(load)) {
            self.pending.remove(key);
        }
    }

    /// Whether a load for `key` is in flight
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }
}

impl<T: Clone + 'static> Default for InFlightLoads<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_cache_keeps_insertion_order() {
        let mut cache = KeyedCache::new();
        cache.insert("b", 2);
        cache.insert("a", 1);
        cache.insert("b", 3);
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(cache.get("b"), Some(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_evicts_oldest_untouched_entry() {
        let mut cache = KeyedCache::with_policy(Box::new(LeastRecentlyUsed::new(2)));
        cache.insert("first", 1);
        cache.insert("second", 2);
        cache.get("first");
        let evicted = cache.insert("third", 3);
        assert_eq!(evicted, vec![("second".to_string(), 2)]);
        assert!(cache.contains("first"));
        assert!(cache.contains("third"));
    }

    #[test]
    fn test_remove_updates_order() {
        let mut cache = KeyedCache::new();
        cache.insert("x", 1);
        assert_eq!(cache.remove("x"), Some(1));
        assert!(cache.is_empty());
        assert_eq!(cache.keys().count(), 0);
    }

    #[test]
    fn test_in_flight_loads_share_one_future() {
        let mut loads: InFlightLoads<u32> = InFlightLoads::new();
        let mut starts = 0;
        let (first, started_first) = loads.join_or_start("k", || {
            starts += 1;
            async { 7 }
        });
        let (second, started_second) = loads.join_or_start("k", || {
            starts += 1;
            async { 8 }
        });
        assert!(started_first);
        assert!(!started_second);
        assert_eq!(starts, 1);
        assert_eq!(pollster::block_on(first.clone()), 7);
        assert_eq!(pollster::block_on(second.clone()), 7);
        loads.finish("k", &first);
        assert!(!loads.is_pending("k"));
    }

    #[test]
    fn test_late_finish_keeps_newer_load() {
        let mut loads: InFlightLoads<Result<u32, String>> = InFlightLoads::new();
        let (failed, _) = loads.join_or_start("k", || async { Err("offline".to_string()) });
        let (waiter, _) = loads.join_or_start("k", || async { Ok(1) });
        assert!(pollster::block_on(failed.clone()).is_err());
        loads.finish("k", &failed);

        let (retry, started) = loads.join_or_start("k", || async { Ok(2) });
        assert!(started);
        assert!(pollster::block_on(waiter.clone()).is_err());
        loads.finish("k", &waiter);
        assert!(loads.is_pending("k"));

        let (joined, started_again) = loads.join_or_start("k", || async { Ok(3) });
        assert!(!started_again);
        assert_eq!(pollster::block_on(joined), Ok(2));
        loads.finish("k", &retry);
        assert!(!loads.is_pending("k"));
    }
}
