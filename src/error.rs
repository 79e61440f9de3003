//! Error types returned by cache operations.
//!
//! Both variants describe key presence, not failures of the cache itself:
//! a lookup of an absent key yields [`CacheError::NotFound`] and a conditional
//! insert of a present key yields [`CacheError::NotStored`]. Neither leaves the
//! cache partially modified.

use thiserror::Error;

/// Result type alias for cache operations.
pub type Result<T> = core::result::Result<T, CacheError>;

/// Errors reported by [`Cache`](crate::Cache) and [`LruCache`](crate::LruCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CacheError {
    /// The key is not present in the cache.
    ///
    /// Returned by lookups and by `remove`. Callers removing a key usually
    /// ignore it.
    #[error("item not found")]
    NotFound,

    /// The key is already present, so `add` left the cache untouched.
    #[error("item not stored")]
    NotStored,
}
