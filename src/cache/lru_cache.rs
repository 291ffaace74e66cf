//! Least-recently-used pair cache.
//!
//! Wraps [`lru::LruCache`] keyed with `FxBuildHasher`. Reads update recency,
//! so every operation takes the lock mutably.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;

use super::CacheError;
use super::SequenceCache;
use crate::error::Error;
use crate::error::Result;
use crate::sequence::SequencePair;

/// A bounded LRU cache of pairs.
pub struct LruSequenceCache {
    inner: Mutex<LruCache<u32, SequencePair, FxBuildHasher>>,
}

impl LruSequenceCache {
    /// Create a cache holding at most `capacity` pairs.
    ///
    /// Fails when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<LruSequenceCache> {
        let cap = NonZeroUsize::new(capacity)
            .ok_or(Error::InvalidCapacity { capacity, minimum: 1 })?;
        return Ok(LruSequenceCache {
            inner: Mutex::new(LruCache::with_hasher(cap, FxBuildHasher)),
        });
    }

    /// Number of pairs currently held.
    pub fn len(&self) -> usize {
        return self.inner.lock().len();
    }

    pub fn is_empty(&self) -> bool {
        return self.inner.lock().is_empty();
    }
}

impl std::fmt::Debug for LruSequenceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        return write!(f, "LruSequenceCache {{ len: {}, cap: {} }}", inner.len(), inner.cap());
    }
}

impl SequenceCache for LruSequenceCache {
    fn get(&self, index: u32) -> Result<Option<SequencePair>, CacheError> {
        return Ok(self.inner.lock().get(&index).cloned());
    }

    fn set(&self, index: u32, pair: &SequencePair) -> Result<(), CacheError> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.get_mut(&index) {
            existing.clone_from(pair);
        } else {
            inner.put(index, pair.clone());
        }
        return Ok(());
    }

    fn capacity(&self) -> usize {
        return self.inner.lock().cap().get();
    }
}
