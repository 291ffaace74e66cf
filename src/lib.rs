//! Fibtrack - a movable cursor over the Fibonacci sequence.
//!
//! Values are arbitrary precision. The interesting part is keeping lookups
//! cheap near anything already visited while memory stays bounded: the
//! sparse [`SequenceTracker`] caches one pair every `cache_pad` indices in a
//! pluggable [`SequenceCache`], and the dense [`GrowableTracker`] keeps a
//! contiguous prefix that grows geometrically.
//!
//! # Quick Start
//!
//! ```
//! use fibtrack::cache::RingCache;
//! use fibtrack::cursor::Cursor;
//! use fibtrack::tracker::SequenceTracker;
//!
//! let tracker = SequenceTracker::new(10, RingCache::new(1024)?)?;
//! assert_eq!(tracker.get(100).to_string(), "354224848179261915075");
//!
//! let cursor = Cursor::new(tracker);
//! cursor.advance();
//! cursor.advance();
//! assert_eq!(cursor.advance().value, "2");
//! # Ok::<(), fibtrack::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod cursor;
pub mod dense;
mod error;
pub mod journal;
pub mod sequence;
pub mod stats;
pub mod tracker;

pub use cache::SequenceCache;
pub use dense::GrowableTracker;
pub use error::Error;
pub use error::Result;
pub use sequence::SequencePair;
pub use sequence::SequenceSource;
pub use tracker::SequenceTracker;
