//! Last-writer-wins versioned register
//!
//! The single replicated cell of a node. Local writes bump the generation by
//! one; remote copies are adopted only when their generation is strictly
//! newer. Equal generations keep the incumbent, so duplicate deliveries and
//! re-gossip of an already-seen state never oscillate.

use crate::error::{Error, Result};
use crate::types::Snapshot;
use parking_lot::RwLock;

/// Replicated `(value, generation)` guarded by one reader/writer lock.
#[derive(Debug, Default)]
pub struct VersionedValue {
    state: RwLock<Snapshot>,
}

impl VersionedValue {
    /// Create a register at generation 0
    pub fn new(value: i64) -> Self {
        Self {
            state: RwLock::new(Snapshot {
                value,
                generation: 0,
            }),
        }
    }

    /// Record a local write. Always advances the generation, even when the
    /// value is unchanged.
    ///
    /// Fails without touching the register once the generation is at
    /// `u64::MAX`; it can never move backwards.
    pub fn write(&self, value: i64) -> Result<Snapshot> {
        let mut state = self.state.write();
        let generation = state
            .generation
            .checked_add(1)
            .ok_or(Error::GenerationExhausted)?;
        *state = Snapshot { value, generation };
        Ok(*state)
    }

    /// Consistent snapshot of the current pair
    pub fn read(&self) -> Snapshot {
        *self.state.read()
    }

    /// Adopt a remote pair iff `generation` is strictly greater than ours.
    ///
    /// Returns whether the pair was adopted. The comparison and the overwrite
    /// happen under the same exclusive lock.
    pub fn merge(&self, value: i64, generation: u64) -> bool {
        let mut state = self.state.write();
        if generation <= state.generation {
            return false;
        }
        *state = Snapshot { value, generation };
        true
    }
}
