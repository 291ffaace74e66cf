//! Startup configuration.
//!
//! Values come from defaults, then an optional JSON file, then command-line
//! overrides. [`Config::validate`] runs once everything is merged; an
//! invalid configuration is fatal at startup.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::cache::LruSequenceCache;
use crate::cache::RingCache;
use crate::cache::SequenceCache;
use crate::dense::DEFAULT_GROWTH_FACTOR;
use crate::dense::GrowableTracker;
use crate::error::Error;
use crate::error::Result;
use crate::tracker::DEFAULT_PROBE_WINDOW;
use crate::tracker::SequenceTracker;

/// Which storage strategy serves lookups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Sparse tracker over a slot-striped cache.
    #[default]
    Ring,
    /// Sparse tracker over an LRU cache.
    Lru,
    /// Dense prefix store grown on demand.
    Dense,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub backend: Backend,
    /// Interval between cached indices (sparse backends).
    pub cache_pad: u32,
    /// Cached pairs (sparse) or prefix slots (dense).
    pub capacity: usize,
    /// Anchors probed by a close-hit search.
    pub probe_window: u32,
    /// Values precomputed at startup.
    pub initial_fill: u32,
    /// Dense growth multiple.
    pub growth_factor: u32,
    pub journal_path: PathBuf,
    pub journal_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        return Config {
            backend: Backend::Ring,
            cache_pad: 10,
            capacity: 100_000,
            probe_window: DEFAULT_PROBE_WINDOW,
            initial_fill: 0,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            journal_path: PathBuf::from("fibapi_backup"),
            journal_seconds: 3,
        };
    }
}

impl Config {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let raw = std::fs::read(path.as_ref())?;
        return Ok(serde_json::from_slice(&raw)?);
    }

    /// Reject values no tracker can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.cache_pad == 0 {
            return Err(Error::InvalidPad);
        }
        let minimum = match self.backend {
            Backend::Dense => 2,
            Backend::Ring | Backend::Lru => 1,
        };
        if self.capacity < minimum {
            return Err(Error::InvalidCapacity {
                capacity: self.capacity,
                minimum,
            });
        }
        if self.probe_window == 0 {
            return Err(Error::InvalidProbeWindow);
        }
        if self.growth_factor == 0 {
            return Err(Error::InvalidGrowthFactor);
        }
        if self.journal_seconds == 0 {
            return Err(Error::InvalidJournalInterval);
        }
        return Ok(());
    }

    pub fn journal_interval(&self) -> Duration {
        return Duration::from_secs(self.journal_seconds);
    }

    /// Sparse tracker over a ring cache.
    pub fn ring_tracker(&self) -> Result<SequenceTracker<RingCache>> {
        let cache = RingCache::new(self.capacity)?;
        return self.sparse(cache);
    }

    /// Sparse tracker over an LRU cache.
    pub fn lru_tracker(&self) -> Result<SequenceTracker<LruSequenceCache>> {
        let cache = LruSequenceCache::new(self.capacity)?;
        return self.sparse(cache);
    }

    fn sparse<C: SequenceCache>(&self, cache: C) -> Result<SequenceTracker<C>> {
        let mut tracker = SequenceTracker::new(self.cache_pad, cache)?
            .with_probe_window(self.probe_window)?;
        if self.initial_fill > 0 {
            tracker = tracker.with_initialized_store(self.initial_fill);
        }
        return Ok(tracker);
    }

    /// Dense growable tracker.
    pub fn dense_tracker(&self) -> Result<GrowableTracker> {
        let tracker = GrowableTracker::new(self.capacity)?
            .with_growth_factor(self.growth_factor)?
            .with_initial_fill(self.initial_fill as usize);
        return Ok(tracker);
    }
}
