//! Verification of ZK proofs through an external [ZkProofSystem].

use crate::{ProofVerifier, VerifierError, ZkProofSystem};
use alloy_primitives::{Address, B256};
use tracing::debug;

/// The [ZkVerifier] hands the seal, program identifier and journal to an opaque proof system.
/// The prover identity is already committed to by the journal.
#[derive(Debug, Clone)]
pub struct ZkVerifier<P> {
    system: P,
}

impl<P: ZkProofSystem> ZkVerifier<P> {
    pub const fn new(system: P) -> Self {
        Self { system }
    }
}

#[async_trait::async_trait]
impl<P: ZkProofSystem> ProofVerifier for ZkVerifier<P> {
    async fn verify(
        &self,
        proof: &[u8],
        image_id: B256,
        journal: B256,
        prover: Address,
    ) -> Result<bool, VerifierError> {
        if proof.is_empty() {
            return Err(VerifierError::InvalidProofFormat);
        }
        let valid = self.system.verify(proof, image_id, journal)?;
        debug!(target: "zk_verifier", %prover, %journal, valid, "Checked ZK proof");
        Ok(valid)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mocks::MockProofSystem;

    const IMAGE: B256 = B256::repeat_byte(0x33);
    const JOURNAL: B256 = B256::repeat_byte(0x44);

    #[tokio::test]
    async fn accepts_matching_seal() {
        let verifier = ZkVerifier::new(MockProofSystem);
        let seal = MockProofSystem::prove(IMAGE, JOURNAL);
        assert!(verifier.verify(&seal, IMAGE, JOURNAL, Address::ZERO).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_perturbed_inputs() {
        let verifier = ZkVerifier::new(MockProofSystem);
        let seal = MockProofSystem::prove(IMAGE, JOURNAL);
        assert!(!verifier.verify(&seal, B256::ZERO, JOURNAL, Address::ZERO).await.unwrap());
        assert!(!verifier.verify(&seal, IMAGE, B256::ZERO, Address::ZERO).await.unwrap());
        assert_eq!(
            verifier.verify(&[], IMAGE, JOURNAL, Address::ZERO).await,
            Err(VerifierError::InvalidProofFormat)
        );
    }
}
