//! # Strata Error Types
//!
//! Capacity and configuration errors raised by the substrate.
//!
//! Lookups that miss (stale hotel handles, absent hash keys) are not errors:
//! they come back as `None` / `false` because they happen every frame.

use thiserror::Error;

/// Errors that can occur in the memory substrate.
///
/// Every variant signals a sizing or programming defect in the caller. The
/// `try_*` operations surface them so the caller can report context; the
/// plain operations abort with the same message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrataError {
    /// An arena allocation did not fit in the remaining buffer.
    #[error("arena capacity exceeded: requested {requested} bytes, {available} bytes available")]
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes left between the aligned offset and the end of the buffer.
        available: usize,
    },

    /// A fixed-capacity container would have had to grow.
    #[error("fixed-capacity container is full: capacity {capacity}, {requested} slots required")]
    GrowthForbidden {
        /// Capacity the container was created with.
        capacity: usize,
        /// Slots the operation needed.
        requested: usize,
    },

    /// An index past the end of a sequence.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Length of the sequence at the time of the call.
        len: usize,
    },

    /// A ranking that does not cover every element exactly once by length.
    #[error("ranking has {ranked} entries, sequence has {len} elements")]
    RankingMismatch {
        /// Entries in the ranking.
        ranked: usize,
        /// Length of the sequence.
        len: usize,
    },

    /// Alignment is not a power of two or exceeds what the arena guarantees.
    #[error("invalid alignment {alignment}: must be a power of two no larger than {max}")]
    InvalidAlignment {
        /// The requested alignment.
        alignment: usize,
        /// Largest supported alignment.
        max: usize,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for substrate operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Aborts with the error's message.
///
/// Used by the non-`try` entry points: capacity violations mean the caller's
/// sizing is wrong and are never recovered from.
#[cold]
#[track_caller]
pub(crate) fn fatal(err: &StrataError) -> ! {
    panic!("{err}")
}
