//! Least Recently Used (LRU) Cache Implementation
//!
//! This module provides the eviction engine shared by every cache type in the
//! crate, plus [`LruCache`], its single-threaded front end.
//!
//! # Algorithm
//!
//! Entries live in a doubly linked recency list. The head holds the most
//! recently used entry, the tail the least recently used one. A hash map
//! indexes every key to its list node so lookups never scan the list:
//!
//! ```text
//!                  head                                       tail
//!                +-------+       +-------+       +-------+
//!  recency list  | (k,v) |<----->| (k,v) |<----->| (k,v) |
//!                +-------+       +-------+       +-------+
//!                    ^               ^               ^
//!  index             |               |               |
//!  +-----+------+    |               |               |
//!  |  k  | node-+----+               |               |
//!  |  k  | node-+--------------------+               |
//!  |  k  | node-+------------------------------------+
//!  +-----+------+
//! ```
//!
//! Every access moves the entry to the head. Inserting a new key into a full
//! cache repurposes the tail node in place: its old key leaves the index, the
//! node takes the new pair, and it moves to the head. The evicting insert
//! therefore performs no allocation.
//!
//! # Performance Characteristics
//!
//! - Get / Set / Add / Remove: O(1)
//! - Memory: one heap node per entry (two pointers plus the key and value)
//!   plus one index slot per entry
//!
//! # Thread Safety
//!
//! [`LruCache`] is not thread-safe. Use [`Cache`](crate::Cache) to share one
//! cache between threads.

use crate::config::LruCacheConfig;
use crate::error::{CacheError, Result};
use crate::list::{self, Entry, List};
use crate::metrics::{CacheMetrics, LruCacheMetrics};
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use core::num::NonZeroUsize;

#[cfg(feature = "hashbrown")]
pub use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
pub use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// LRU engine: recency list, key index and counters.
///
/// Both [`LruCache`] and [`Cache`](crate::Cache) delegate to this type, so the
/// algorithm exists in exactly one place.
///
/// # Safety
///
/// The index stores raw pointers into `list`. They stay valid because:
/// - every pointer was returned by `list.add()`
/// - a key leaves the index in the same operation that detaches or
///   repurposes its node
/// - the segment owns the list, so nodes outlive every index entry
pub(crate) struct LruSegment<K, V, S = DefaultHashBuilder> {
    list: List<(K, V)>,
    map: HashMap<K, *mut Entry<(K, V)>, S>,
    metrics: LruCacheMetrics,
}

// SAFETY: the segment owns every node its pointers refer to; moving it to
// another thread moves that ownership along.
unsafe impl<K: Send, V: Send, S: Send> Send for LruSegment<K, V, S> {}

// SAFETY: mutation requires &mut self; shared references only hand out &K / &V.
unsafe impl<K: Sync, V: Sync, S: Sync> Sync for LruSegment<K, V, S> {}

impl<K: Hash + Eq, V, S: BuildHasher> LruSegment<K, V, S> {
    pub(crate) fn with_hasher(cap: NonZeroUsize, hash_builder: S) -> Self {
        let map_capacity = cap.get().next_power_of_two();
        LruSegment {
            list: List::new(cap),
            map: HashMap::with_capacity_and_hasher(map_capacity, hash_builder),
            metrics: LruCacheMetrics::new(),
        }
    }

    #[inline]
    pub(crate) fn cap(&self) -> NonZeroUsize {
        self.list.cap()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub(crate) fn metrics(&self) -> &LruCacheMetrics {
        &self.metrics
    }

    /// Looks up `key`, touching the entry on a hit.
    pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(node) = self.map.get(key).copied() else {
            self.metrics.record_miss();
            return None;
        };
        self.metrics.record_hit();
        // SAFETY: node comes from our map
        unsafe {
            self.list.move_to_front(node);
            Some(&(*node).get_value().1)
        }
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(node) = self.map.get(key).copied() else {
            self.metrics.record_miss();
            return None;
        };
        self.metrics.record_hit();
        // SAFETY: node comes from our map
        unsafe {
            self.list.move_to_front(node);
            Some(&mut (*node).get_value_mut().1)
        }
    }

    /// Looks up `key` without touching the entry or the counters.
    pub(crate) fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.map.get(key).copied()?;
        // SAFETY: node comes from our map
        unsafe { Some(&(*node).get_value().1) }
    }

    #[inline]
    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Removes the least recently used entry.
    pub(crate) fn pop_lru(&mut self) -> Option<(K, V)> {
        let (key, value) = self.list.remove_last()?.into_value();
        self.map.remove(&key);
        self.metrics.record_eviction();
        Some((key, value))
    }

    /// Removes `key` and returns its value.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.map.remove(key)?;
        // SAFETY: node comes from our map and was just unindexed
        let entry = unsafe { self.list.remove(node) }?;
        self.metrics.record_removal();
        Some(entry.into_value().1)
    }

    /// Changes the capacity, evicting from the tail until the entries fit.
    ///
    /// A capacity of zero is ignored.
    pub(crate) fn set_cap(&mut self, cap: usize) {
        let Some(new_cap) = NonZeroUsize::new(cap) else {
            tracing::debug!(capacity = self.cap().get(), "ignoring resize to zero capacity");
            return;
        };

        let old_cap = self.cap().get();
        let mut evicted = 0usize;
        while self.len() > new_cap.get() && self.pop_lru().is_some() {
            evicted += 1;
        }
        self.list.set_cap(new_cap);

        tracing::debug!(old_cap, new_cap = new_cap.get(), evicted, "resized cache");
    }

    /// Drops every entry; the capacity and counters are kept.
    pub(crate) fn clear(&mut self) {
        let discarded = self.len();
        self.map.clear();
        self.list.clear();
        tracing::debug!(discarded, "purged cache");
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.list.iter(),
        }
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> LruSegment<K, V, S> {
    /// Inserts or overwrites `key`.
    ///
    /// Returns the displaced pair: the previous pair for a present key, or the
    /// evicted least recently used pair when a new key arrives at capacity.
    pub(crate) fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&node) = self.map.get(&key) {
            self.metrics.record_update();
            // The stored key stays; it is the one the index holds.
            // SAFETY: node comes from our map
            let old = unsafe {
                self.list.move_to_front(node);
                mem::replace(&mut (*node).get_value_mut().1, value)
            };
            return Some((key, old));
        }

        if self.list.is_full() {
            if let Some(node) = self.list.last() {
                // Clone before touching the index so a panicking clone leaves
                // the cache unchanged.
                let new_key = key.clone();
                // SAFETY: node is a live entry of our list and is re-indexed
                // under the new key before this block ends
                let evicted = unsafe {
                    self.map.remove(&(*node).get_value().0);
                    let evicted = self.list.update(node, (new_key, value));
                    self.list.move_to_front(node);
                    evicted
                };
                self.map.insert(key, node);
                self.metrics.record_eviction();
                self.metrics.record_insertion();
                tracing::trace!(
                    capacity = self.cap().get(),
                    len = self.len(),
                    "evicted least recently used entry"
                );
                return Some(evicted);
            }
        }

        if let Some(node) = self.list.add((key.clone(), value)) {
            self.map.insert(key, node);
            self.metrics.record_insertion();
        }
        None
    }

    /// Inserts `key` only if it is absent.
    pub(crate) fn add(&mut self, key: K, value: V) -> Result<()> {
        if self.map.contains_key(&key) {
            return Err(CacheError::NotStored);
        }
        self.put(key, value);
        Ok(())
    }
}

impl<K, V, S> fmt::Debug for LruSegment<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruSegment")
            .field("capacity", &self.list.cap())
            .field("len", &self.list.len())
            .finish()
    }
}

/// Iterator over the entries of a cache from most to least recently used.
///
/// Iterating does not touch any entry.
pub struct Iter<'a, K, V> {
    inner: list::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.inner.len())
            .finish()
    }
}

/// A single-threaded Least Recently Used (LRU) cache.
///
/// The cache has a fixed capacity and supports O(1) operations for
/// inserting, retrieving, and removing entries. When the cache reaches capacity,
/// the least recently used entry is evicted to make room for new entries.
///
/// # Examples
///
/// ```
/// use lrucache::{CacheError, LruCache};
/// use core::num::NonZeroUsize;
///
/// let mut cache = LruCache::new(NonZeroUsize::new(2).unwrap());
///
/// cache.set("apple", 1);
/// cache.set("banana", 2);
///
/// // Accessing items updates their recency
/// assert_eq!(cache.get(&"apple"), Ok(&1));
///
/// // Adding beyond capacity evicts the least recently used item
/// cache.set("cherry", 3);
/// assert_eq!(cache.get(&"banana"), Err(CacheError::NotFound));
/// assert_eq!(cache.get(&"apple"), Ok(&1));
/// assert_eq!(cache.get(&"cherry"), Ok(&3));
/// ```
#[derive(Debug)]
pub struct LruCache<K, V, S = DefaultHashBuilder> {
    segment: LruSegment<K, V, S>,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Creates a new LRU cache holding at most `cap` entries.
    pub fn new(cap: NonZeroUsize) -> Self {
        Self::with_hasher(cap, DefaultHashBuilder::default())
    }

    /// Creates a new LRU cache from a configuration with an optional hasher.
    ///
    /// If `hasher` is `None`, the default hash builder is used.
    pub fn init(config: LruCacheConfig, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::with_hasher(config.capacity, hasher.unwrap_or_default())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> LruCache<K, V, S> {
    /// Creates a new LRU cache with the specified capacity and hash builder.
    pub fn with_hasher(cap: NonZeroUsize, hash_builder: S) -> Self {
        Self {
            segment: LruSegment::with_hasher(cap, hash_builder),
        }
    }

    /// Returns the configured capacity.
    #[inline]
    pub fn size(&self) -> usize {
        self.segment.cap().get()
    }

    /// Returns the number of entries in the cache.
    #[inline]
    pub fn len(&self) -> usize {
        self.segment.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segment.is_empty()
    }

    /// Returns a reference to the value of `key`, marking it most recently used.
    #[inline]
    pub fn get<Q>(&mut self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.get(key).ok_or(CacheError::NotFound)
    }

    /// Returns a mutable reference to the value of `key`, marking it most recently used.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.get_mut(key).ok_or(CacheError::NotFound)
    }

    /// Returns a reference to the value of `key` without changing its recency.
    #[inline]
    pub fn peek<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.peek(key).ok_or(CacheError::NotFound)
    }

    /// Returns `true` if `key` is present. Does not change its recency.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.contains_key(key)
    }

    /// Removes `key` and returns its value.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.remove(key).ok_or(CacheError::NotFound)
    }

    /// Removes and returns the least recently used entry.
    #[inline]
    pub fn evict_oldest(&mut self) -> Option<(K, V)> {
        self.segment.pop_lru()
    }

    /// Changes the capacity, evicting least recently used entries that no
    /// longer fit. A size of zero is ignored.
    #[inline]
    pub fn set_size(&mut self, size: usize) {
        self.segment.set_cap(size);
    }

    /// Removes every entry. The capacity is unchanged.
    #[inline]
    pub fn purge(&mut self) {
        self.segment.clear();
    }

    /// Iterates over the entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.segment.iter()
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> LruCache<K, V, S> {
    /// Inserts or overwrites `key`, marking it most recently used.
    ///
    /// # Returns
    ///
    /// - `Some((key, old_value))` if the key was already present
    /// - `Some((evicted_key, evicted_value))` if the cache was full
    /// - `None` otherwise
    #[inline]
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.segment.put(key, value)
    }

    /// Inserts `key` only if it is absent.
    ///
    /// Returns [`CacheError::NotStored`] without touching the existing entry
    /// if the key is already present.
    #[inline]
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        self.segment.add(key, value)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> CacheMetrics for LruCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.segment.metrics().metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        self.segment.metrics().algorithm_name()
    }
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> IntoIterator for &'a LruCache<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;

    fn make_lru<K: Hash + Eq, V>(cap: usize) -> LruCache<K, V> {
        LruCache::new(NonZeroUsize::new(cap).unwrap())
    }

    fn keys<K: Hash + Eq + Copy, V>(cache: &LruCache<K, V>) -> Vec<K> {
        cache.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_lru_get_set() {
        let mut cache = make_lru(2);
        assert_eq!(cache.set("apple", 1), None);
        assert_eq!(cache.set("banana", 2), None);
        assert_eq!(cache.get(&"apple"), Ok(&1));
        assert_eq!(cache.get(&"banana"), Ok(&2));
        assert_eq!(cache.get(&"cherry"), Err(CacheError::NotFound));
        assert_eq!(cache.set("apple", 3), Some(("apple", 1)));
        assert_eq!(cache.get(&"apple"), Ok(&3));
        assert_eq!(cache.set("cherry", 4), Some(("banana", 2)));
        assert_eq!(cache.get(&"banana"), Err(CacheError::NotFound));
        assert_eq!(cache.get(&"apple"), Ok(&3));
        assert_eq!(cache.get(&"cherry"), Ok(&4));
    }

    #[test]
    fn test_lru_get_mut() {
        let mut cache = make_lru(2);
        cache.set("apple", 1);
        cache.set("banana", 2);
        if let Ok(v) = cache.get_mut(&"apple") {
            *v = 3;
        }
        assert_eq!(cache.get(&"apple"), Ok(&3));
        cache.set("cherry", 4);
        assert_eq!(cache.get(&"banana"), Err(CacheError::NotFound));
        assert_eq!(cache.get(&"apple"), Ok(&3));
        assert_eq!(cache.get(&"cherry"), Ok(&4));
    }

    #[test]
    fn test_lru_add() {
        let mut cache = make_lru(2);
        assert_eq!(cache.add("apple", 1), Ok(()));
        assert_eq!(cache.add("apple", 2), Err(CacheError::NotStored));
        assert_eq!(cache.peek(&"apple"), Ok(&1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_add_does_not_touch_existing() {
        let mut cache = make_lru(2);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.add("a", 10), Err(CacheError::NotStored));
        cache.set("c", 3);
        // "a" was not refreshed by the rejected add, so it was the oldest
        assert_eq!(cache.peek(&"a"), Err(CacheError::NotFound));
        assert_eq!(keys(&cache), ["c", "b"]);
    }

    #[test]
    fn test_lru_add_evicts_when_full() {
        let mut cache = make_lru(2);
        cache.add("a", 1).unwrap();
        cache.add("b", 2).unwrap();
        cache.add("c", 3).unwrap();
        assert_eq!(keys(&cache), ["c", "b"]);
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = make_lru(2);
        cache.set("apple", 1);
        cache.set("banana", 2);
        assert_eq!(cache.remove(&"apple"), Ok(1));
        assert_eq!(cache.get(&"apple"), Err(CacheError::NotFound));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.remove(&"apple"), Err(CacheError::NotFound));
        assert_eq!(cache.remove(&"cherry"), Err(CacheError::NotFound));
        assert_eq!(cache.set("cherry", 3), None);
        assert_eq!(cache.get(&"banana"), Ok(&2));
        assert_eq!(cache.get(&"cherry"), Ok(&3));
    }

    #[test]
    fn test_lru_purge() {
        let mut cache = make_lru(2);
        cache.set("apple", 1);
        cache.set("banana", 2);
        cache.purge();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 2);
        assert_eq!(cache.get(&"apple"), Err(CacheError::NotFound));
        cache.set("cherry", 3);
        assert_eq!(cache.get(&"cherry"), Ok(&3));
    }

    #[test]
    fn test_lru_capacity_limits() {
        let mut cache = make_lru(2);
        cache.set("apple", 1);
        cache.set("banana", 2);
        cache.set("cherry", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"apple"), Err(CacheError::NotFound));
        assert_eq!(cache.get(&"banana"), Ok(&2));
        assert_eq!(cache.get(&"cherry"), Ok(&3));
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut cache = make_lru(1);
        cache.set(1, "one");
        assert_eq!(cache.set(2, "two"), Some((1, "one")));
        assert_eq!(cache.set(2, "deux"), Some((2, "two")));
        assert_eq!(keys(&cache), [2]);
    }

    #[test]
    fn test_lru_iter_order() {
        let mut cache = make_lru(3);
        cache.set(1, ());
        cache.set(2, ());
        cache.set(3, ());
        assert_eq!(keys(&cache), [3, 2, 1]);

        cache.get(&1).unwrap();
        assert_eq!(keys(&cache), [1, 3, 2]);

        cache.set(2, ());
        assert_eq!(keys(&cache), [2, 1, 3]);

        // peek and contains_key leave the order alone
        cache.peek(&3).unwrap();
        assert!(cache.contains_key(&3));
        assert_eq!(keys(&cache), [2, 1, 3]);
    }

    #[test]
    fn test_lru_set_size_shrinks_from_tail() {
        let mut cache = make_lru(4);
        for i in 0..4 {
            cache.set(i, i * 10);
        }
        cache.set_size(2);
        assert_eq!(cache.size(), 2);
        assert_eq!(keys(&cache), [3, 2]);

        cache.set(4, 40);
        assert_eq!(keys(&cache), [4, 3]);
    }

    #[test]
    fn test_lru_set_size_grows() {
        let mut cache = make_lru(1);
        cache.set(1, ());
        cache.set_size(3);
        cache.set(2, ());
        cache.set(3, ());
        assert_eq!(cache.len(), 3);
        assert_eq!(keys(&cache), [3, 2, 1]);
    }

    #[test]
    fn test_lru_set_size_zero_is_ignored() {
        let mut cache = make_lru(2);
        cache.set(1, ());
        cache.set(2, ());
        cache.set_size(0);
        assert_eq!(cache.size(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_evict_oldest() {
        let mut cache = make_lru(3);
        assert_eq!(cache.evict_oldest(), None);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.evict_oldest(), Some(("a", 1)));
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains_key(&"a"));
    }

    #[test]
    fn test_lru_string_keys() {
        let mut cache = make_lru(2);
        let key1 = String::from("apple");
        let key2 = String::from("banana");
        cache.set(key1.clone(), 1);
        cache.set(key2.clone(), 2);
        assert_eq!(cache.get(&key1), Ok(&1));
        assert_eq!(cache.get(&key2), Ok(&2));
        assert_eq!(cache.get("apple"), Ok(&1));
        assert_eq!(cache.remove("banana"), Ok(2));
    }

    #[test]
    fn test_lru_values_dropped_on_eviction() {
        let tracker = Rc::new(());
        let mut cache = make_lru(2);
        cache.set(1, Rc::clone(&tracker));
        cache.set(2, Rc::clone(&tracker));
        drop(cache.set(3, Rc::clone(&tracker)));
        assert_eq!(Rc::strong_count(&tracker), 3);

        cache.set_size(1);
        assert_eq!(Rc::strong_count(&tracker), 2);

        drop(cache);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[derive(Debug, Clone, Eq, PartialEq)]
    struct ComplexValue {
        val: i32,
        description: String,
    }

    #[test]
    fn test_lru_complex_values() {
        let mut cache = make_lru(2);
        let fruit = |val: i32, description: &str| ComplexValue {
            val,
            description: String::from(description),
        };
        cache.set(String::from("apple"), fruit(1, "First fruit"));
        cache.set(String::from("banana"), fruit(2, "Second fruit"));
        let evicted = cache.set(String::from("cherry"), fruit(3, "Third fruit"));
        assert_eq!(
            evicted,
            Some((String::from("apple"), fruit(1, "First fruit")))
        );
        assert_eq!(cache.remove("apple"), Err(CacheError::NotFound));
        assert_eq!(cache.get("cherry").map(|v| v.val), Ok(3));
    }

    #[test]
    fn test_lru_metrics() {
        let mut cache = make_lru(2);
        let metrics = cache.metrics();
        assert_eq!(metrics.get("requests"), Some(&0.0));
        assert_eq!(metrics.get("cache_hits"), Some(&0.0));

        cache.set("apple", 1);
        cache.set("banana", 2);
        cache.set("banana", 3);
        let _ = cache.get(&"apple");
        let _ = cache.get(&"banana");
        let _ = cache.get(&"cherry");
        cache.set("cherry", 3);
        let _ = cache.remove(&"banana");

        let metrics = cache.metrics();
        assert_eq!(metrics.get("requests"), Some(&3.0));
        assert_eq!(metrics.get("cache_hits"), Some(&2.0));
        assert_eq!(metrics.get("cache_misses"), Some(&1.0));
        assert_eq!(metrics.get("insertions"), Some(&3.0));
        assert_eq!(metrics.get("updates"), Some(&1.0));
        assert_eq!(metrics.get("evictions"), Some(&1.0));
        assert_eq!(metrics.get("removals"), Some(&1.0));
        assert_eq!(cache.algorithm_name(), "LRU");
    }

    #[test]
    fn test_lru_segment_directly() {
        let mut segment: LruSegment<&str, i32, DefaultHashBuilder> =
            LruSegment::with_hasher(NonZeroUsize::new(2).unwrap(), DefaultHashBuilder::default());
        assert_eq!(segment.len(), 0);
        assert!(segment.is_empty());
        assert_eq!(segment.cap().get(), 2);
        segment.put("a", 1);
        segment.put("b", 2);
        assert_eq!(segment.len(), 2);
        assert_eq!(segment.get(&"a"), Some(&1));
        assert_eq!(segment.get(&"b"), Some(&2));
        assert_eq!(segment.len(), segment.list.len());
    }

    #[test]
    fn test_lru_index_points_at_matching_node() {
        let mut cache = make_lru(3);
        for i in 0..10 {
            cache.set(i % 5, i);
            let _ = cache.get(&(i % 3));
            for (key, &node) in cache.segment.map.iter() {
                // SAFETY: node comes from the index of a live cache
                assert_eq!(unsafe { &(*node).get_value().0 }, key);
            }
            assert_eq!(cache.segment.map.len(), cache.segment.list.len());
        }
    }

    /// Key whose `Eq`/`Hash` only look at `id`, so two equal keys can still be
    /// told apart by `tag`.
    #[derive(Debug, Clone, Copy)]
    struct TaggedKey {
        id: u32,
        tag: &'static str,
    }

    impl PartialEq for TaggedKey {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl Eq for TaggedKey {}

    impl Hash for TaggedKey {
        fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    #[test]
    fn test_lru_update_keeps_stored_key() {
        let mut cache = make_lru(2);
        let original = TaggedKey { id: 1, tag: "original" };
        let caller = TaggedKey { id: 1, tag: "caller" };
        cache.set(original, 10);

        let (returned_key, old_value) = cache.set(caller, 20).unwrap();
        assert_eq!(returned_key.tag, "caller");
        assert_eq!(old_value, 10);

        let (stored_key, value) = cache.iter().next().unwrap();
        assert_eq!(stored_key.tag, "original");
        assert_eq!(*value, 20);
        for (key, &node) in cache.segment.map.iter() {
            // SAFETY: node comes from the index of a live cache
            assert_eq!(unsafe { (*node).get_value().0.tag }, key.tag);
        }
    }

    #[test]
    fn test_lru_panicking_key_clone_leaves_cache_intact() {
        extern crate std;
        use core::sync::atomic::{AtomicBool, Ordering};
        use std::panic::{self, AssertUnwindSafe};

        static PANIC_ON_CLONE: AtomicBool = AtomicBool::new(false);

        #[derive(Debug, PartialEq, Eq, Hash)]
        struct FragileKey(u32);

        impl Clone for FragileKey {
            fn clone(&self) -> Self {
                if PANIC_ON_CLONE.load(Ordering::SeqCst) {
                    panic!("clone failed");
                }
                FragileKey(self.0)
            }
        }

        let mut cache = make_lru(2);
        cache.set(FragileKey(1), 1);
        cache.set(FragileKey(2), 2);

        PANIC_ON_CLONE.store(true, Ordering::SeqCst);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            cache.set(FragileKey(3), 3);
        }));
        PANIC_ON_CLONE.store(false, Ordering::SeqCst);
        assert!(result.is_err());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.iter().count(), cache.len());
        assert!(cache.contains_key(&FragileKey(1)));
        assert!(cache.contains_key(&FragileKey(2)));
        assert!(!cache.contains_key(&FragileKey(3)));
        let keys: Vec<u32> = cache.iter().map(|(k, _)| k.0).collect();
        assert_eq!(keys, [2, 1]);

        // The cache keeps working after the failed insert
        assert_eq!(cache.set(FragileKey(3), 3), Some((FragileKey(1), 1)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_init_from_config() {
        let config = LruCacheConfig {
            capacity: NonZeroUsize::new(7).unwrap(),
        };
        let cache: LruCache<u32, u32> = LruCache::init(config, None);
        assert_eq!(cache.size(), 7);
    }

    #[test]
    fn test_lru_behind_mutex() {
        extern crate std;
        use std::sync::{Arc, Mutex};
        use std::thread;

        let cache = Arc::new(Mutex::new(make_lru(50)));
        let mut handles: Vec<thread::JoinHandle<()>> = Vec::new();

        for t in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    let key = std::format!("key_{}", i % 100);
                    let mut guard = cache.lock().unwrap();
                    if i % 2 == 0 {
                        guard.set(key, t * 1000 + i);
                    } else {
                        let _ = guard.get(&key);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let guard = cache.lock().unwrap();
        assert!(guard.len() <= 50);
    }
}
