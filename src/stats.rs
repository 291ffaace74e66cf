//! Hit/miss counters for understanding how lookups are served.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;

/// Three monotonically increasing counters, one bumped per lookup.
#[derive(Debug, Default)]
pub struct CacheStats {
    direct: AtomicU64,
    close: AtomicU64,
    miss: AtomicU64,
}

/// A point-in-time copy of [`CacheStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Served straight from storage.
    pub direct: u64,
    /// Served by a short walk from a nearby anchor.
    pub close: u64,
    /// Served by a walk from the origin (or an uncached recompute).
    pub miss: u64,
}

impl CacheStats {
    pub fn new() -> CacheStats {
        return CacheStats::default();
    }

    #[inline]
    pub fn direct_hit(&self) {
        self.direct.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn close_hit(&self) {
        self.close.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn miss(&self) {
        self.miss.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        return StatsSnapshot {
            direct: self.direct.load(Ordering::Relaxed),
            close: self.close.load(Ordering::Relaxed),
            miss: self.miss.load(Ordering::Relaxed),
        };
    }
}

impl StatsSnapshot {
    /// Number of lookups counted.
    pub fn total(&self) -> u64 {
        return self.direct + self.close + self.miss;
    }
}
