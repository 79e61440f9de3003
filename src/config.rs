//! Cache Configuration Module
//!
//! Configuration structs have all public fields for simple instantiation:
//!
//! - **Simple**: Just create the struct with all fields set
//! - **Type safety**: A zero capacity cannot be expressed
//! - **No boilerplate**: No constructors or builder methods needed
//!
//! # Examples
//!
//! ```
//! use lrucache::config::LruCacheConfig;
//! use lrucache::LruCache;
//! use core::num::NonZeroUsize;
//!
//! let config = LruCacheConfig {
//!     capacity: NonZeroUsize::new(1000).unwrap(),
//! };
//!
//! // Create cache from config, using the default hasher
//! let cache: LruCache<String, i32> = LruCache::init(config, None);
//! assert_eq!(cache.size(), 1000);
//! ```

use core::fmt;
use core::num::NonZeroUsize;

/// Configuration for an LRU (Least Recently Used) cache.
///
/// Used by both [`LruCache`](crate::LruCache) and [`Cache`](crate::Cache).
///
/// # Fields
///
/// - `capacity`: Maximum number of entries the cache can hold. Capacity is a
///   count of entries; the size of keys and values is not accounted for.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LruCacheConfig {
    /// Maximum number of key-value pairs the cache can hold.
    pub capacity: NonZeroUsize,
}

impl fmt::Debug for LruCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCacheConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}
