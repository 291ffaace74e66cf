//! Sequence values and the pair that anchors a walk.
//!
//! The sequence is `v_0 = 0, v_1 = 1, v_n = v_{n-1} + v_{n-2}`. Every cache
//! in this crate stores a [`SequencePair`] rather than a single value, so a
//! single entry is enough to resume the recurrence from its index.
//!
//! A pair anchored at `i` holds `v_i` and `v_{i-1}`. Extending the
//! recurrence one step backwards gives `v_{-1} = 1`, which makes the origin
//! pair `(0, 1)`.

use num_bigint::BigUint;
use num_traits::One;
use num_traits::Zero;

use crate::stats::StatsSnapshot;

/// The values at index `i` and `i - 1`.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct SequencePair {
    /// Value at `i`.
    pub current: BigUint,
    /// Value at `i - 1`.
    pub previous: BigUint,
}

impl SequencePair {
    /// The pair anchored at index 0: `(v_0, v_{-1}) = (0, 1)`.
    pub fn origin() -> SequencePair {
        return SequencePair {
            current: BigUint::zero(),
            previous: BigUint::one(),
        };
    }

    /// Create a pair from the value at an index and the one before it.
    pub fn new(current: BigUint, previous: BigUint) -> SequencePair {
        return SequencePair { current, previous };
    }

    /// Move the pair from `i` to `i + 1` in place.
    ///
    /// Adds into `previous` then swaps, so both allocations are reused.
    #[inline]
    pub fn advance(&mut self) {
        self.previous += &self.current;
        std::mem::swap(&mut self.current, &mut self.previous);
    }
}

impl Clone for SequencePair {
    fn clone(&self) -> SequencePair {
        return SequencePair {
            current: self.current.clone(),
            previous: self.previous.clone(),
        };
    }

    // Cache slots are overwritten with `clone_from`; keep their digit buffers.
    fn clone_from(&mut self, source: &SequencePair) {
        self.current.clone_from(&source.current);
        self.previous.clone_from(&source.previous);
    }
}

/// Anything that can serve the value at an index.
///
/// Implemented by the sparse [`SequenceTracker`](crate::tracker::SequenceTracker)
/// and the dense [`GrowableTracker`](crate::dense::GrowableTracker).
pub trait SequenceSource: Send + Sync {
    /// Return the value at `index`. Never fails.
    fn get(&self, index: u32) -> BigUint;

    /// Current hit/miss counters.
    fn stats(&self) -> StatsSnapshot;
}

impl<S: SequenceSource + ?Sized> SequenceSource for std::sync::Arc<S> {
    fn get(&self, index: u32) -> BigUint {
        return (**self).get(index);
    }

    fn stats(&self) -> StatsSnapshot {
        return (**self).stats();
    }
}

/// Walk the recurrence from the origin without any caching.
pub fn nth(index: u32) -> BigUint {
    let mut pair = SequencePair::origin();
    for _ in 0..index {
        pair.advance();
    }
    return pair.current;
}
