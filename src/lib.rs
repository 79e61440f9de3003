#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Choosing a Type
//!
//! | Type | Receiver | Use when |
//! |------|----------|----------|
//! | [`Cache`] | `&self` | The cache is shared between threads |
//! | [`LruCache`] | `&mut self` | One owner, or the caller already holds a lock |
//!
//! Both types run the same engine and follow the same rules:
//!
//! - `get` / `get_mut` / `get_with` / `get_mut_with` / `set` move the entry to
//!   the most recently used position.
//! - `add` and `peek` / `contains_key` never change the order.
//! - Inserting a new key into a full cache evicts the least recently used entry.
//! - A lookup of an absent key returns [`CacheError::NotFound`]; `add` of a
//!   present key returns [`CacheError::NotStored`].
//!
//! ## Single-Threaded Use
//!
//! ```rust
//! use lrucache::{CacheError, LruCache};
//! use core::num::NonZeroUsize;
//!
//! let mut cache = LruCache::new(NonZeroUsize::new(2).unwrap());
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get(&"a").unwrap(); // "a" becomes most recently used
//! cache.set("c", 3);        // "b" evicted (least recently used)
//! assert_eq!(cache.get(&"b"), Err(CacheError::NotFound));
//! ```
//!
//! ## Resizing
//!
//! ```rust
//! use lrucache::LruCache;
//! use core::num::NonZeroUsize;
//!
//! let mut cache = LruCache::new(NonZeroUsize::new(3).unwrap());
//! for i in 0..3 {
//!     cache.set(i, i * 10);
//! }
//!
//! cache.set_size(2);          // evicts key 0, the least recently used
//! let keys: Vec<_> = cache.iter().map(|(k, _)| *k).collect();
//! assert_eq!(keys, [2, 1]);
//!
//! cache.set_size(0);          // ignored
//! assert_eq!(cache.size(), 2);
//! ```
//!
//! ## Modules
//!
//! - `cache`: Thread-safe cache (requires `concurrent` feature)
//! - [`lru`]: LRU engine and single-threaded cache
//! - [`config`]: Configuration structure
//! - [`error`]: Error type
//! - [`metrics`]: Usage counters

#![no_std]

extern crate alloc;

#[cfg(not(feature = "hashbrown"))]
extern crate std;

/// Doubly linked recency list with in-place editing.
///
/// Internal infrastructure exposing raw pointer operations; use the cache
/// types instead.
pub(crate) mod list;

/// Cache configuration.
pub mod config;

/// Errors returned by cache operations.
pub mod error;

/// Cache usage counters.
pub mod metrics;

/// Least Recently Used (LRU) engine and single-threaded cache.
pub mod lru;

/// Thread-safe LRU cache guarded by a single mutex.
///
/// Available when the `concurrent` feature is enabled.
#[cfg(feature = "concurrent")]
pub mod cache;

#[cfg(feature = "concurrent")]
pub use cache::Cache;
pub use error::{CacheError, Result};
pub use lru::LruCache;
