//! An in-memory L1 chain serving both block hash lookup tiers.

use crate::{BlockHashSource, HISTORY_BLOCK_WINDOW, RECENT_BLOCK_WINDOW};
use alloy_primitives::{keccak256, B256, U256};

/// The [MemoryL1History] is an append-only list of canonical L1 block hashes. The head is the
/// block currently being built, so its own hash is unknown.
#[derive(Debug, Clone, Default)]
pub struct MemoryL1History {
    hashes: Vec<B256>,
}

impl MemoryL1History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history of `count` blocks with deterministic hashes.
    pub fn with_blocks(count: u64) -> Self {
        let mut history = Self::new();
        for _ in 0..count {
            history.push_block(keccak256(U256::from(history.head()).to_be_bytes::<32>()));
        }
        history
    }

    /// Seals the current head with `hash` and advances the head.
    pub fn push_block(&mut self, hash: B256) {
        self.hashes.push(hash);
    }

    /// Returns the hash of a sealed block regardless of its age.
    pub fn block_hash(&self, number: u64) -> Option<B256> {
        self.hashes.get(usize::try_from(number).ok()?).copied()
    }

    fn within(&self, number: u64, window: u64) -> Option<B256> {
        let age = self.head().checked_sub(number)?;
        (age != 0 && age <= window).then_some(())?;
        self.block_hash(number)
    }
}

impl BlockHashSource for MemoryL1History {
    fn head(&self) -> u64 {
        self.hashes.len() as u64
    }

    fn recent_block_hash(&self, number: u64) -> Option<B256> {
        self.within(number, RECENT_BLOCK_WINDOW)
    }

    fn historical_block_hash(&self, number: u64) -> Option<B256> {
        self.within(number, HISTORY_BLOCK_WINDOW)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_tiers_respect_windows() {
        let history = MemoryL1History::with_blocks(10_000);
        assert_eq!(history.head(), 10_000);
        assert!(history.recent_block_hash(10_000).is_none());
        assert!(history.recent_block_hash(9_999).is_some());
        assert!(history.recent_block_hash(10_000 - 256).is_some());
        assert!(history.recent_block_hash(10_000 - 257).is_none());
        assert!(history.historical_block_hash(10_000 - 257).is_some());
        assert!(history.historical_block_hash(10_000 - 8191).is_some());
        assert!(history.historical_block_hash(10_000 - 8192).is_none());
    }

    #[test]
    fn push_block_advances_head() {
        let mut history = MemoryL1History::new();
        history.push_block(B256::repeat_byte(1));
        history.push_block(B256::repeat_byte(2));
        assert_eq!(history.head(), 2);
        assert_eq!(history.block_hash(1), Some(B256::repeat_byte(2)));
        assert_ne!(
            MemoryL1History::with_blocks(2).block_hash(0),
            MemoryL1History::with_blocks(2).block_hash(1)
        );
    }
}
