//! Encoding of the structural data a game is created with.
//!
//! Layout: `l2_sequence_number (32, big-endian) ‖ parent_index (4, big-endian) ‖
//! intermediate_roots (32 each)`. The length is fixed by the configured intervals, so padded or
//! truncated blobs are rejected instead of producing a distinct game UUID for the same proposal.

use crate::{GameConfig, GameError, GameId};
use alloy_primitives::{Bytes, U256};
use multiproof_primitives::Claim;

/// The decoded extra data of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraData {
    /// The L2 sequence number the root claim commits to.
    pub l2_sequence_number: u64,
    /// The game this proposal builds on, or [None] when it builds on the anchor.
    pub parent: Option<GameId>,
    /// The intermediate output roots, one per intermediate block interval.
    pub intermediate_roots: Vec<Claim>,
}

impl ExtraData {
    pub fn new(
        l2_sequence_number: u64,
        parent: Option<GameId>,
        intermediate_roots: Vec<Claim>,
    ) -> Self {
        Self {
            l2_sequence_number,
            parent,
            intermediate_roots,
        }
    }

    /// Decodes extra data, enforcing the exact length implied by `config`.
    pub fn decode(raw: &[u8], config: &GameConfig) -> Result<Self, GameError> {
        if raw.len() != config.extra_data_len() {
            return Err(GameError::BadExtraData);
        }

        let sequence = U256::from_be_slice(&raw[..32]);
        let l2_sequence_number = u64::try_from(sequence).map_err(|_| GameError::BadExtraData)?;

        let mut parent_index = [0u8; 4];
        parent_index.copy_from_slice(&raw[32..36]);
        let parent = GameId::from_parent_index(u32::from_be_bytes(parent_index));

        let intermediate_roots = raw[36..].chunks_exact(32).map(Claim::from_slice).collect();

        Ok(Self {
            l2_sequence_number,
            parent,
            intermediate_roots,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut raw = Vec::with_capacity(36 + 32 * self.intermediate_roots.len());
        raw.extend_from_slice(&U256::from(self.l2_sequence_number).to_be_bytes::<32>());
        raw.extend_from_slice(&GameId::to_parent_index(self.parent).to_be_bytes());
        for root in &self.intermediate_roots {
            raw.extend_from_slice(root.as_slice());
        }
        raw.into()
    }
}
