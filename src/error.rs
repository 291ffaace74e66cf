//! Errors raised while building or running the cursor.
//!
//! Lookups never fail. Everything here happens at construction, while
//! loading configuration, or in the journal worker.

use thiserror::Error;

/// Errors for construction, configuration, and journaling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A cache or dense store was asked to hold fewer entries than it needs.
    #[error("capacity {capacity} is too small (minimum {minimum})")]
    InvalidCapacity { capacity: usize, minimum: usize },
    /// The caching interval must be at least one.
    #[error("cache pad must be positive")]
    InvalidPad,
    /// The close-hit search must probe at least one anchor.
    #[error("probe window must be positive")]
    InvalidProbeWindow,
    /// Dense growth must make progress.
    #[error("growth factor must be positive")]
    InvalidGrowthFactor,
    /// The journal interval must be non-zero.
    #[error("journal interval must be positive")]
    InvalidJournalInterval,
    /// Reading or writing a file or stream failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// JSON could not be parsed or produced.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// The journal worker gave up after too many failed writes in a row.
    #[error("journal failed {failures} times in a row: {source}")]
    JournalExhausted {
        failures: u32,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
