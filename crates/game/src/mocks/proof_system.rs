//! A ZK proof system whose seals are hash commitments to the image and journal.

use crate::{VerifierError, ZkProofSystem};
use alloy_primitives::{keccak256, B256};

#[derive(Debug, Clone, Copy, Default)]
pub struct MockProofSystem;

impl MockProofSystem {
    /// Produces a seal that verifies for exactly `(image_id, journal)`.
    pub fn prove(image_id: B256, journal: B256) -> Vec<u8> {
        keccak256([image_id.as_slice(), journal.as_slice()].concat()).to_vec()
    }
}

impl ZkProofSystem for MockProofSystem {
    fn verify(&self, seal: &[u8], image_id: B256, journal: B256) -> Result<bool, VerifierError> {
        if seal.len() != 32 {
            return Err(VerifierError::ProofSystem(format!(
                "expected a 32 byte seal, got {}",
                seal.len()
            )));
        }
        Ok(seal == Self::prove(image_id, journal).as_slice())
    }
}
