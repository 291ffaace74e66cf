//! Dense prefix store that grows on demand.
//!
//! The first `capacity` values live in a fixed slice of write-once slots.
//! Slots `0..=last_index` are published; reading them takes no lock. A
//! lookup past `last_index` tries to become the single grower:
//!
//! ```text
//!   Idle ──(index > last_index, nobody growing)──▶ Growing ──(publish)──▶ Idle
//! ```
//!
//! The grower extends the prefix to `index * growth_factor` (clamped to the
//! capacity) so sequential forward access grows geometrically rather than
//! once per index. A lookup that arrives while someone else is growing does
//! not wait: it recomputes from the last published pair. Indices beyond the
//! capacity are always recomputed that way.
//!
//! Only `{ last_index, updating }` sits behind the mutex. Slots are written
//! before `last_index` is advanced under the lock, so anyone who observes the
//! new `last_index` also observes the values.

use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::One;
use num_traits::Zero;
use parking_lot::Mutex;

use crate::error::Error;
use crate::error::Result;
use crate::sequence::SequencePair;
use crate::sequence::SequenceSource;
use crate::sequence::nth;
use crate::stats::CacheStats;
use crate::stats::StatsSnapshot;

/// Default multiple of the requested index to grow to.
pub const DEFAULT_GROWTH_FACTOR: u32 = 2;

#[derive(Debug)]
struct GrowthState {
    last_index: usize,
    updating: bool,
}

/// What a lookup past the published prefix is allowed to do.
enum Claim {
    /// Someone published the index while we waited for the lock.
    Published,
    /// Another grow is in flight, or the store is full.
    Busy,
    /// This caller grows the prefix from `from` to `to`.
    Grow { from: usize, to: usize },
}

/// Clears `updating` however the grow ends, publishing progress if any.
struct GrowthGuard<'a> {
    state: &'a Mutex<GrowthState>,
    reached: Option<usize>,
}

impl Drop for GrowthGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let Some(reached) = self.reached {
            state.last_index = state.last_index.max(reached);
        }
        state.updating = false;
    }
}

/// Serves sequence values from a dense, geometrically grown prefix.
///
/// Counters: `direct` for published slots, `close` for lookups served by a
/// grow they performed, `miss` for on-the-fly recomputes.
pub struct GrowableTracker {
    slots: Box<[OnceLock<BigUint>]>,
    state: Mutex<GrowthState>,
    growth_factor: u32,
    stats: CacheStats,
}

impl GrowableTracker {
    /// Create a store with room for `capacity` values, seeded with `v_0`
    /// and `v_1`.
    pub fn new(capacity: usize) -> Result<GrowableTracker> {
        if capacity < 2 {
            return Err(Error::InvalidCapacity { capacity, minimum: 2 });
        }
        let slots: Box<[OnceLock<BigUint>]> = (0..capacity).map(|_| OnceLock::new()).collect();
        let _ = slots[0].set(BigUint::zero());
        let _ = slots[1].set(BigUint::one());
        tracing::debug!(capacity, "created growable tracker");
        return Ok(GrowableTracker {
            slots,
            state: Mutex::new(GrowthState {
                last_index: 1,
                updating: false,
            }),
            growth_factor: DEFAULT_GROWTH_FACTOR,
            stats: CacheStats::new(),
        });
    }

    pub fn with_growth_factor(mut self, growth_factor: u32) -> Result<GrowableTracker> {
        if growth_factor == 0 {
            return Err(Error::InvalidGrowthFactor);
        }
        self.growth_factor = growth_factor;
        return Ok(self);
    }

    /// Eagerly publish the first `count` values (clamped to the capacity).
    pub fn with_initial_fill(self, count: usize) -> GrowableTracker {
        let to = count.min(self.slots.len()).saturating_sub(1);
        let from = self.last_index();
        if to > from {
            self.state.lock().updating = true;
            self.grow(from, to);
        }
        return self;
    }

    /// Highest published index. Never decreases.
    pub fn last_index(&self) -> usize {
        return self.state.lock().last_index;
    }

    /// Whether a grow is in flight.
    pub fn is_growing(&self) -> bool {
        return self.state.lock().updating;
    }

    pub fn capacity(&self) -> usize {
        return self.slots.len();
    }

    pub fn stats(&self) -> StatsSnapshot {
        return self.stats.snapshot();
    }

    #[inline]
    fn published(&self, index: usize) -> Option<&BigUint> {
        return self.slots.get(index).and_then(OnceLock::get);
    }

    /// The pair anchored at a published index `>= 1`.
    fn pair_at(&self, index: usize) -> SequencePair {
        match (self.published(index), index.checked_sub(1).and_then(|i| self.published(i))) {
            (Some(current), Some(previous)) => {
                return SequencePair::new(current.clone(), previous.clone());
            }
            _ => {
                let mut pair = SequencePair::origin();
                for _ in 0..index {
                    pair.advance();
                }
                return pair;
            }
        }
    }

    fn claim(&self, index: usize) -> Claim {
        let mut state = self.state.lock();
        if index <= state.last_index {
            return Claim::Published;
        }
        let last_slot = self.slots.len() - 1;
        if state.updating || state.last_index >= last_slot {
            return Claim::Busy;
        }
        let wanted = (index as u64).saturating_mul(self.growth_factor as u64);
        let to = wanted.max(index as u64).min(last_slot as u64) as usize;
        state.updating = true;
        return Claim::Grow {
            from: state.last_index,
            to,
        };
    }

    /// Fill slots `from + 1..=to` and publish `to`. The caller must have set
    /// `updating`.
    fn grow(&self, from: usize, to: usize) {
        let mut guard = GrowthGuard {
            state: &self.state,
            reached: None,
        };
        tracing::debug!(from, to, "growing dense store");
        let mut pair = self.pair_at(from);
        for slot in &self.slots[from + 1..=to] {
            pair.advance();
            // Only the single grower writes past `last_index`.
            let _ = slot.set(pair.current.clone());
        }
        guard.reached = Some(to);
    }

    /// Walk forward from the last published pair.
    fn recompute(&self, index: usize) -> BigUint {
        let last = self.last_index();
        if index <= last {
            return match self.published(index) {
                Some(value) => value.clone(),
                None => nth(index as u32),
            };
        }
        let mut pair = self.pair_at(last);
        for _ in last..index {
            pair.advance();
        }
        return pair.current;
    }

    /// Value at `index`. Never fails; always bumps exactly one counter.
    pub fn get(&self, index: u32) -> BigUint {
        let i = index as usize;
        if let Some(value) = self.published(i) {
            self.stats.direct_hit();
            return value.clone();
        }

        match self.claim(i) {
            Claim::Published => {
                if let Some(value) = self.published(i) {
                    self.stats.direct_hit();
                    return value.clone();
                }
            }
            Claim::Grow { from, to } => {
                self.grow(from, to);
                if let Some(value) = self.published(i) {
                    self.stats.close_hit();
                    return value.clone();
                }
            }
            Claim::Busy => {}
        }

        self.stats.miss();
        return self.recompute(i);
    }
}

impl SequenceSource for GrowableTracker {
    fn get(&self, index: u32) -> BigUint {
        return GrowableTracker::get(self, index);
    }

    fn stats(&self) -> StatsSnapshot {
        return GrowableTracker::stats(self);
    }
}
