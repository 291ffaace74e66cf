//! Sparse sequence tracker.
//!
//! Only indices that are multiples of `cache_pad` are ever stored, so the
//! cache holds at most `len / pad` pairs and any stored anchor is at most
//! `pad` steps from the indices it serves.
//!
//! # Lookup order
//!
//! 1. Direct hit: `index % pad == 0` and `index` is cached.
//! 2. Direct hit one below an anchor: `(index + 1) % pad == 0` and
//!    `index + 1` is cached; its pair carries `v_index` as `previous`. Each
//!    pair therefore serves two indices.
//! 3. Close hit: probe `round_down(index)`, then one pad lower, and so on for
//!    at most `probe_window` anchors. Walk forward from the first anchor found.
//! 4. Miss: walk forward from the origin.
//!
//! Walks backfill every multiple of the pad they pass, so the next lookup in
//! the same neighbourhood finds an anchor at most one pad away.
//!
//! Cache failures are indistinguishable from misses. A value is always
//! computed, whatever state the backend is in.

use num_bigint::BigUint;

use crate::cache::SequenceCache;
use crate::error::Error;
use crate::error::Result;
use crate::sequence::SequencePair;
use crate::sequence::SequenceSource;
use crate::stats::CacheStats;
use crate::stats::StatsSnapshot;

/// How many anchors a close-hit search probes before giving up.
pub const DEFAULT_PROBE_WINDOW: u32 = 10;

/// Serves sequence values through a sparse pair cache.
pub struct SequenceTracker<C: SequenceCache> {
    cache_pad: u32,
    probe_window: u32,
    stats: CacheStats,
    cache: C,
}

impl<C: SequenceCache> SequenceTracker<C> {
    /// Create a tracker caching every `cache_pad`-th pair in `cache`.
    ///
    /// The origin pair is stored at index 0 straight away.
    pub fn new(cache_pad: u32, cache: C) -> Result<SequenceTracker<C>> {
        if cache_pad == 0 {
            return Err(Error::InvalidPad);
        }
        if let Err(err) = cache.set(0, &SequencePair::origin()) {
            tracing::trace!(%err, "could not seed origin pair");
        }
        tracing::debug!(
            cache_pad,
            capacity = cache.capacity(),
            "created sequence tracker"
        );
        return Ok(SequenceTracker {
            cache_pad,
            probe_window: DEFAULT_PROBE_WINDOW,
            stats: CacheStats::new(),
            cache,
        });
    }

    /// Set how many anchors a close-hit search may probe.
    pub fn with_probe_window(mut self, probe_window: u32) -> Result<SequenceTracker<C>> {
        if probe_window == 0 {
            return Err(Error::InvalidProbeWindow);
        }
        self.probe_window = probe_window;
        return Ok(self);
    }

    /// Precompute up to index `max(2, count)`, backfilling as it goes.
    ///
    /// Does not touch the counters.
    pub fn with_initialized_store(self, count: u32) -> SequenceTracker<C> {
        let target = count.max(2);
        self.walk(0, SequencePair::origin(), target);
        tracing::debug!(target, "initialized tracker store");
        return self;
    }

    #[inline]
    pub fn cache_pad(&self) -> u32 {
        return self.cache_pad;
    }

    #[inline]
    pub fn probe_window(&self) -> u32 {
        return self.probe_window;
    }

    /// The backend, for inspection.
    pub fn cache(&self) -> &C {
        return &self.cache;
    }

    pub fn stats(&self) -> StatsSnapshot {
        return self.stats.snapshot();
    }

    /// Round `index` down to a multiple of the pad.
    ///
    /// Never exceeds `index`; anything below one pad rounds to 0.
    #[inline]
    pub fn round_down_to_pad(&self, index: u32) -> u32 {
        return index - index % self.cache_pad;
    }

    /// Read through the cache, folding backend errors into a miss.
    fn lookup(&self, index: u32) -> Option<SequencePair> {
        match self.cache.get(index) {
            Ok(found) => return found,
            Err(err) => {
                tracing::trace!(index, %err, "cache read failed");
                return None;
            }
        }
    }

    fn store(&self, index: u32, pair: &SequencePair) {
        if let Err(err) = self.cache.set(index, pair) {
            tracing::trace!(index, %err, "cache write dropped");
        }
    }

    /// Walk from the pair anchored at `start` up to `target`, storing each
    /// pad multiple passed on the way. Returns the value at `target`.
    fn walk(&self, start: u32, mut pair: SequencePair, target: u32) -> BigUint {
        debug_assert!(start <= target);
        let mut index = start;
        while index < target {
            pair.advance();
            index += 1;
            if index % self.cache_pad == 0 {
                self.store(index, &pair);
            }
        }
        return pair.current;
    }

    /// Value at `index`. Never fails; always bumps exactly one counter.
    pub fn get(&self, index: u32) -> BigUint {
        let pad = self.cache_pad;

        if index % pad == 0 {
            if let Some(pair) = self.lookup(index) {
                self.stats.direct_hit();
                return pair.current;
            }
        } else if let Some(next) = index.checked_add(1) {
            if next % pad == 0 {
                if let Some(pair) = self.lookup(next) {
                    self.stats.direct_hit();
                    return pair.previous;
                }
            }
        }

        let mut anchor = self.round_down_to_pad(index);
        for _ in 0..self.probe_window {
            if let Some(pair) = self.lookup(anchor) {
                self.stats.close_hit();
                return self.walk(anchor, pair, index);
            }
            match anchor.checked_sub(pad) {
                Some(lower) => anchor = lower,
                None => break,
            }
        }

        self.stats.miss();
        tracing::trace!(index, "no anchor in probe window, walking from origin");
        return self.walk(0, SequencePair::origin(), index);
    }
}

impl<C: SequenceCache> SequenceSource for SequenceTracker<C> {
    fn get(&self, index: u32) -> BigUint {
        return SequenceTracker::get(self, index);
    }

    fn stats(&self) -> StatsSnapshot {
        return SequenceTracker::stats(self);
    }
}
