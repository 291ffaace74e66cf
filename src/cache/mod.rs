//! Pluggable storage for sequence pairs.
//!
//! A cache maps an index to the [`SequencePair`] anchored there. The tracker
//! decides which indices are worth storing; a backend only decides where they
//! live and what gets overwritten when it runs out of room.
//!
//! # Backends
//!
//! - [`RingCache`]: fixed slots addressed by `index % capacity`,
//!   last writer wins.
//! - [`LruSequenceCache`]: bounded least-recently-used eviction, for access
//!   patterns that stripe poorly across slots.

mod lru_cache;
mod ring;

pub use self::lru_cache::LruSequenceCache;
pub use self::ring::CacheEntry;
pub use self::ring::RingCache;

use thiserror::Error;

use crate::sequence::SequencePair;

/// A failure reported by a cache backend.
///
/// The tracker treats every variant as "not cached": a failed read is a
/// miss, a failed write is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The backend could not be reached.
    #[error("cache backend unavailable")]
    Unavailable,
    /// The backend refused to store the pair.
    #[error("cache backend rejected write at index {index}")]
    Rejected { index: u32 },
}

/// Storage for pairs keyed by their anchor index.
///
/// Implementations must be safe to share between threads; all methods take
/// `&self`.
pub trait SequenceCache: Send + Sync {
    /// Look up the pair anchored at `index`.
    ///
    /// `Ok(None)` is an ordinary miss.
    fn get(&self, index: u32) -> Result<Option<SequencePair>, CacheError>;

    /// Store `pair` as the pair anchored at `index`, replacing whatever
    /// the backend chooses to evict.
    fn set(&self, index: u32, pair: &SequencePair) -> Result<(), CacheError>;

    /// Maximum number of pairs held at once.
    fn capacity(&self) -> usize;
}
