//! Thread-safe LRU Cache
//!
//! [`Cache`] wraps the LRU engine behind a single [`parking_lot::Mutex`]. Every
//! operation takes the lock for its whole duration, so all callers observe one
//! global recency order and eviction is exact LRU across every key.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Cache                     │
//! │  ┌────────────────────────────────────────┐  │
//! │  │                 Mutex                  │  │
//! │  │  ┌──────────────┐   ┌───────────────┐  │  │
//! │  │  │ recency list │◀──│ key index     │  │  │
//! │  │  └──────────────┘   └───────────────┘  │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Why Mutex Instead of RwLock?
//!
//! A `get` moves the entry to the head of the recency list, so even lookups
//! mutate shared state. An `RwLock` would hand out write locks for every
//! operation anyway.
//!
//! # Example
//!
//! ```rust
//! use lrucache::Cache;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache = Arc::new(Cache::new(1000));
//!
//! let handles: Vec<_> = (0..4).map(|t| {
//!     let cache = Arc::clone(&cache);
//!     thread::spawn(move || {
//!         for i in 0..100 {
//!             cache.set(format!("key_{}_{}", t, i), i);
//!         }
//!     })
//! }).collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(cache.len(), 400);
//! ```

use crate::config::LruCacheConfig;
use crate::error::{CacheError, Result};
use crate::lru::{DefaultHashBuilder, LruSegment};
use crate::metrics::CacheMetrics;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::num::NonZeroUsize;
use parking_lot::Mutex;

/// A thread-safe, fixed-capacity LRU cache.
///
/// All methods take `&self`; share the cache between threads with `Arc` or
/// scoped borrows.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq`; inserting also needs `Clone`.
/// - `V`: Value type. `get` and `peek` return clones and need `V: Clone`;
///   [`get_with`](Self::get_with) works for any `V`.
/// - `S`: Hash builder type. Defaults to `DefaultHashBuilder`.
///
/// # Example
///
/// ```
/// use lrucache::{Cache, CacheError};
///
/// let cache = Cache::new(2);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// assert_eq!(cache.get(&"a"), Ok(1));
///
/// // "b" is now the least recently used entry
/// cache.set("c", 3);
/// assert_eq!(cache.get(&"b"), Err(CacheError::NotFound));
///
/// assert_eq!(cache.add("a", 10), Err(CacheError::NotStored));
/// assert_eq!(cache.remove(&"a"), Ok(1));
/// ```
pub struct Cache<K, V, S = DefaultHashBuilder> {
    segment: Mutex<LruSegment<K, V, S>>,
}

impl<K: Hash + Eq, V> Cache<K, V> {
    /// Creates a cache holding at most `size` entries.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0. A zero-sized cache is a programming error; use
    /// [`Cache::init`] with a `NonZeroUsize` to rule it out at compile time.
    pub fn new(size: usize) -> Self {
        match NonZeroUsize::new(size) {
            Some(cap) => Self::with_hasher(cap, DefaultHashBuilder::default()),
            None => panic!("size must be > 0 and now == {}", size),
        }
    }

    /// Creates a cache from a configuration with an optional hasher.
    ///
    /// If `hasher` is `None`, the default hash builder is used.
    pub fn init(config: LruCacheConfig, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::with_hasher(config.capacity, hasher.unwrap_or_default())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Cache<K, V, S> {
    /// Creates a cache with a custom hash builder.
    ///
    /// Use this for deterministic hashing or DoS-resistant hashers.
    pub fn with_hasher(cap: NonZeroUsize, hash_builder: S) -> Self {
        Self {
            segment: Mutex::new(LruSegment::with_hasher(cap, hash_builder)),
        }
    }

    /// Returns the configured capacity.
    pub fn size(&self) -> usize {
        self.segment.lock().cap().get()
    }

    /// Changes the capacity.
    ///
    /// When the cache holds more than `size` entries, the least recently used
    /// ones are evicted until it fits. A size of zero is ignored.
    pub fn set_size(&self, size: usize) {
        self.segment.lock().set_cap(size);
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.segment.lock().len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.segment.lock().is_empty()
    }

    /// Returns a clone of the value of `key` and marks it most recently used.
    ///
    /// Returns [`CacheError::NotFound`] if the key is absent.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.segment
            .lock()
            .get(key)
            .cloned()
            .ok_or(CacheError::NotFound)
    }

    /// Runs `f` on the value of `key` while holding the lock and marks the
    /// entry most recently used.
    ///
    /// Avoids cloning the value. `f` must not call back into this cache.
    ///
    /// # Example
    ///
    /// ```
    /// use lrucache::Cache;
    ///
    /// let cache = Cache::new(10);
    /// cache.set("key", String::from("hello world"));
    /// assert_eq!(cache.get_with(&"key", |v| v.len()), Ok(11));
    /// ```
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Result<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        self.segment
            .lock()
            .get(key)
            .map(f)
            .ok_or(CacheError::NotFound)
    }

    /// Runs `f` on a mutable reference to the value of `key` while holding the
    /// lock and marks the entry most recently used.
    ///
    /// `f` must not call back into this cache.
    ///
    /// # Example
    ///
    /// ```
    /// use lrucache::Cache;
    ///
    /// let cache = Cache::new(10);
    /// cache.set("counter", 0);
    /// cache.get_mut_with(&"counter", |v| *v += 1).unwrap();
    /// assert_eq!(cache.get(&"counter"), Ok(1));
    /// ```
    pub fn get_mut_with<Q, F, R>(&self, key: &Q, f: F) -> Result<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&mut V) -> R,
    {
        self.segment
            .lock()
            .get_mut(key)
            .map(f)
            .ok_or(CacheError::NotFound)
    }

    /// Returns a clone of the value of `key` without changing its recency.
    pub fn peek<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.segment
            .lock()
            .peek(key)
            .cloned()
            .ok_or(CacheError::NotFound)
    }

    /// Returns `true` if `key` is present. Does not change its recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.lock().contains_key(key)
    }

    /// Removes `key` and returns its value.
    ///
    /// Returns [`CacheError::NotFound`] if the key is absent; callers that only
    /// want the key gone can ignore it.
    pub fn remove<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.lock().remove(key).ok_or(CacheError::NotFound)
    }

    /// Removes and returns the least recently used entry.
    pub fn evict_oldest(&self) -> Option<(K, V)> {
        self.segment.lock().pop_lru()
    }

    /// Removes every entry. The capacity is unchanged.
    pub fn purge(&self) {
        self.segment.lock().clear();
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> Cache<K, V, S> {
    /// Inserts or overwrites `key` and marks it most recently used.
    ///
    /// If the key is new and the cache is full, the least recently used entry
    /// is evicted first.
    ///
    /// # Returns
    ///
    /// - `Some((key, old_value))` if the key was already present
    /// - `Some((evicted_key, evicted_value))` if an entry was evicted
    /// - `None` otherwise
    pub fn set(&self, key: K, value: V) -> Option<(K, V)> {
        self.segment.lock().put(key, value)
    }

    /// Inserts `key` only if it is absent.
    ///
    /// Returns [`CacheError::NotStored`] if the key is already present, in
    /// which case neither its value nor its recency changes.
    pub fn add(&self, key: K, value: V) -> Result<()> {
        self.segment.lock().add(key, value)
    }

    /// Returns the keys from most to least recently used.
    ///
    /// Takes a snapshot under the lock; O(n) in the number of entries.
    pub fn keys(&self) -> Vec<K> {
        self.segment
            .lock()
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> CacheMetrics for Cache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.segment.lock().metrics().metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        "LRU"
    }
}

impl<K, V, S> fmt::Debug for Cache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("segment", &*self.segment.lock())
            .finish()
    }
}
