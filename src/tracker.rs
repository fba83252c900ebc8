//! Per-map structural modification counter.
//!
//! The tracker counts insertions, removals and clears. Iterators keep a
//! `Generation` snapshot and compare it against the tracker before each
//! step; a mismatch means another handle changed the map's structure.
//! This catches misuse, it is not a synchronization mechanism.

use crate::error::MapError;

/// Snapshot of a tracker's counter.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct ModificationTracker {
    generation: u64,
    checks: bool,
}

impl ModificationTracker {
    pub fn new(checks: bool) -> Self {
        Self {
            generation: 0,
            checks,
        }
    }

    #[inline]
    pub fn current(&self) -> Generation {
        Generation(self.generation)
    }

    /// Record one structural modification.
    #[inline]
    pub fn structure_changed(&mut self) {
        // Wraps rather than aborts; an iterator would need to observe
        // exactly 2^64 changes between two steps to miss one.
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn checks_enabled(&self) -> bool {
        self.checks
    }

    /// Fail if `seen` is not the current generation.
    #[inline]
    pub fn check(&self, seen: Generation) -> Result<(), MapError> {
        if !self.checks || seen.0 == self.generation {
            return Ok(());
        }
        log::debug!(
            "structural modification detected: iterator at generation {}, map at {}",
            seen.0,
            self.generation
        );
        Err(MapError::ConcurrentModification {
            expected: seen.0,
            actual: self.generation,
        })
    }
}

impl Default for ModificationTracker {
    fn default() -> Self {
        Self::new(true)
    }
}
