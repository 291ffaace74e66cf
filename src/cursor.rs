//! A movable cursor over the sequence.
//!
//! The cursor only knows its index. Values come from whatever
//! [`SequenceSource`] it wraps. Moves are atomic, but concurrent movers
//! interleave in no particular order.

use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::sequence::SequenceSource;
use crate::stats::StatsSnapshot;

/// An index and the value there, rendered in decimal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub index: u32,
    pub value: String,
}

/// The current position in the sequence, movable by one step at a time.
pub struct Cursor<S: SequenceSource> {
    index: AtomicU32,
    source: S,
}

impl<S: SequenceSource> Cursor<S> {
    /// A cursor at index 0.
    pub fn new(source: S) -> Cursor<S> {
        return Cursor::with_index(source, 0);
    }

    /// A cursor resumed at `index`, e.g. from a journal.
    pub fn with_index(source: S, index: u32) -> Cursor<S> {
        return Cursor {
            index: AtomicU32::new(index),
            source,
        };
    }

    /// The index the cursor points at.
    #[inline]
    pub fn index(&self) -> u32 {
        return self.index.load(Ordering::SeqCst);
    }

    pub fn stats(&self) -> StatsSnapshot {
        return self.source.stats();
    }

    fn position(&self, index: u32) -> Position {
        return Position {
            index,
            value: self.source.get(index).to_string(),
        };
    }

    /// Serve the value at the current index without moving.
    pub fn current(&self) -> Position {
        return self.position(self.index());
    }

    /// Step forward and serve the new position. Stays put at `u32::MAX`.
    pub fn advance(&self) -> Position {
        let index = match self.index.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| i.checked_add(1)) {
            Ok(previous) => previous + 1,
            Err(stuck) => stuck,
        };
        return self.position(index);
    }

    /// Step back and serve the new position. Stays put at 0.
    pub fn retreat(&self) -> Position {
        let index = match self.index.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| i.checked_sub(1)) {
            Ok(previous) => previous - 1,
            Err(stuck) => stuck,
        };
        return self.position(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RingCache;
    use crate::tracker::SequenceTracker;

    fn cursor() -> Cursor<SequenceTracker<RingCache>> {
        let cache = RingCache::new(64).unwrap();
        return Cursor::new(SequenceTracker::new(10, cache).unwrap());
    }

    fn at(index: u32, value: &str) -> Position {
        return Position {
            index,
            value: value.to_string(),
        };
    }

    #[test]
    fn starts_at_zero() {
        let cursor = cursor();
        assert_eq!(cursor.current(), at(0, "0"));
    }

    #[test]
    fn advance_and_retreat() {
        let cursor = cursor();
        assert_eq!(cursor.advance(), at(1, "1"));
        assert_eq!(cursor.advance(), at(2, "1"));
        assert_eq!(cursor.advance(), at(3, "2"));
        assert_eq!(cursor.advance(), at(4, "3"));
        assert_eq!(cursor.retreat(), at(3, "2"));
        assert_eq!(cursor.current(), at(3, "2"));
        assert_eq!(cursor.index(), 3);
    }

    #[test]
    fn retreat_stops_at_zero() {
        let cursor = cursor();
        assert_eq!(cursor.retreat(), at(0, "0"));
        assert_eq!(cursor.retreat(), at(0, "0"));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn resumes_at_index() {
        let cache = RingCache::new(64).unwrap();
        let cursor = Cursor::with_index(SequenceTracker::new(10, cache).unwrap(), 50);
        assert_eq!(cursor.current(), at(50, "12586269025"));
    }

    #[test]
    fn concurrent_retreats_never_wrap() {
        let cache = RingCache::new(64).unwrap();
        let cursor = Cursor::with_index(SequenceTracker::new(10, cache).unwrap(), 5);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..4 {
                        cursor.retreat();
                    }
                });
            }
        });
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn concurrent_advances_are_counted() {
        let cursor = cursor();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..25 {
                        cursor.advance();
                    }
                });
            }
        });
        assert_eq!(cursor.index(), 100);
        assert_eq!(cursor.current(), at(100, "354224848179261915075"));
    }

    #[test]
    fn position_serializes_as_index_and_value() {
        let json = serde_json::to_string(&at(7, "13")).unwrap();
        assert_eq!(json, r#"{"index":7,"value":"13"}"#);
    }
}
