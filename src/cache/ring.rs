//! Fixed-size slot cache.
//!
//! Index `i` lives in slot `i % capacity`. A write always overwrites its
//! slot; a read only succeeds when the slot still carries the requested
//! index, so reuse of a slot by another index acts as eviction.
//!
//! One mutex guards every slot. The big-integer arithmetic around each
//! lookup costs far more than the lock, so contention stays modest.

use parking_lot::Mutex;

use super::CacheError;
use super::SequenceCache;
use crate::error::Error;
use crate::error::Result;
use crate::sequence::SequencePair;

/// One slot: the index it currently holds and that index's pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub index: u32,
    pub pair: SequencePair,
}

/// A cache of `capacity` slots striped by index.
#[derive(Debug)]
pub struct RingCache {
    slots: Mutex<Vec<CacheEntry>>,
}

impl RingCache {
    /// Create a cache with `capacity` zeroed slots.
    ///
    /// Every empty slot claims index 0, but only slot 0 is ever consulted
    /// for index 0, so that slot is seeded with the origin pair.
    ///
    /// Fails when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<RingCache> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity { capacity, minimum: 1 });
        }
        let mut slots = vec![CacheEntry::default(); capacity];
        slots[0].pair = SequencePair::origin();
        return Ok(RingCache {
            slots: Mutex::new(slots),
        });
    }

    #[inline]
    fn slot(index: u32, len: usize) -> usize {
        return index as usize % len;
    }

    /// Copy of every slot, in slot order. Useful when debugging placement.
    pub fn entries(&self) -> Vec<CacheEntry> {
        return self.slots.lock().clone();
    }
}

impl SequenceCache for RingCache {
    fn get(&self, index: u32) -> Result<Option<SequencePair>, CacheError> {
        let slots = self.slots.lock();
        let entry = &slots[Self::slot(index, slots.len())];
        if entry.index == index {
            return Ok(Some(entry.pair.clone()));
        }
        return Ok(None);
    }

    fn set(&self, index: u32, pair: &SequencePair) -> Result<(), CacheError> {
        let mut slots = self.slots.lock();
        let slot = Self::slot(index, slots.len());
        let entry = &mut slots[slot];
        entry.index = index;
        entry.pair.clone_from(pair);
        return Ok(());
    }

    fn capacity(&self) -> usize {
        return self.slots.lock().len();
    }
}
