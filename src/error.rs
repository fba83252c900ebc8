//! Error type for map, view and iterator operations.
//!
//! Absence of a key is not an error; lookups return `Option`.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MapError {
    /// The map's structure changed through a handle other than the
    /// iterator since the iterator's last step.
    #[error("concurrent structural modification: iterator expected generation {expected}, map is at {actual}")]
    ConcurrentModification { expected: u64, actual: u64 },

    /// `remove()` was called with no entry pending since the last `next()`.
    #[error("illegal iterator state: no pending entry to remove")]
    IllegalState,

    /// Construction argument check.
    #[error("invalid load factor: {0}")]
    InvalidLoadFactor(f32),
}
