//! The clock module holds the [FinalityClock], which turns the set of proofs a game holds into its
//! resolution deadline.

use crate::{Deadline, GameConfig, GameError, ProvingRecord};

/// The [FinalityClock] picks the fast delay once every proof kind is present and the slow delay
/// otherwise. Deadlines only ever tighten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalityClock {
    pub fast_delay: u64,
    pub slow_delay: u64,
}

impl FinalityClock {
    pub const fn new(fast_delay: u64, slow_delay: u64) -> Self {
        Self {
            fast_delay,
            slow_delay,
        }
    }

    pub const fn from_config(config: &GameConfig) -> Self {
        Self::new(config.fast_finality_delay, config.slow_finality_delay)
    }

    /// Returns the delay that applies to a game holding the given proofs.
    pub fn delay(&self, proving: &ProvingRecord) -> Result<u64, GameError> {
        match proving.count() {
            0 => Err(GameError::NoProofProvided),
            n if n == proving.capacity() => Ok(self.fast_delay),
            _ => Ok(self.slow_delay),
        }
    }

    /// Computes `min(now + delay(proving), current)`.
    pub fn update_deadline(
        &self,
        proving: &ProvingRecord,
        current: Deadline,
        now: u64,
    ) -> Result<Deadline, GameError> {
        let candidate = Deadline::at(now.saturating_add(self.delay(proving)?));
        Ok(candidate.min(current))
    }
}
