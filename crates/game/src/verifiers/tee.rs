//! Verification of TEE proofs: an enclave signature over the journal, bound to a recent L1
//! origin block, from a signer registered under the expected image.

use crate::{
    AttestationValidator, BlockHashSource, ProofVerifier, SignerRecovery, SignerRegistry, TeeProof,
    VerifierError,
};
use alloy_primitives::{Address, B256};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// The number of blocks the cheap block hash lookup serves.
pub const RECENT_BLOCK_WINDOW: u64 = 256;

/// The number of blocks the extended history lookup serves.
pub const HISTORY_BLOCK_WINDOW: u64 = 8191;

/// The [TeeVerifier] is a [ProofVerifier] for attestation-backed enclave signatures. It shares the
/// [SignerRegistry] with the registry's operators.
pub struct TeeVerifier<V, H, S> {
    registry: Arc<RwLock<SignerRegistry<V>>>,
    l1: H,
    recovery: S,
}

impl<V, H, S> TeeVerifier<V, H, S>
where
    V: AttestationValidator,
    H: BlockHashSource,
    S: SignerRecovery,
{
    pub fn new(registry: Arc<RwLock<SignerRegistry<V>>>, l1: H, recovery: S) -> Self {
        Self {
            registry,
            l1,
            recovery,
        }
    }

    pub fn registry(&self) -> &Arc<RwLock<SignerRegistry<V>>> {
        &self.registry
    }

    pub fn l1(&self) -> &H {
        &self.l1
    }

    pub fn l1_mut(&mut self) -> &mut H {
        &mut self.l1
    }

    /// Checks that the L1 origin is a canonical block within the lookback windows.
    pub fn check_l1_origin(&self, hash: B256, number: u64) -> Result<(), VerifierError> {
        let head = self.l1.head();
        if number >= head {
            return Err(VerifierError::L1OriginInFuture { number, head });
        }

        let age = head - number;
        let lookup = match age {
            0..=RECENT_BLOCK_WINDOW => self.l1.recent_block_hash(number),
            _ if age <= HISTORY_BLOCK_WINDOW => self.l1.historical_block_hash(number),
            _ => None,
        };
        let canonical = lookup.ok_or(VerifierError::L1OriginTooOld { number, head })?;

        if canonical != hash {
            return Err(VerifierError::L1OriginHashMismatch {
                claimed: hash,
                actual: canonical,
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<V, H, S> ProofVerifier for TeeVerifier<V, H, S>
where
    V: AttestationValidator,
    H: BlockHashSource,
    S: SignerRecovery,
{
    async fn verify(
        &self,
        proof: &[u8],
        image_id: B256,
        journal: B256,
        prover: Address,
    ) -> Result<bool, VerifierError> {
        let proof = TeeProof::decode(proof)?;
        self.check_l1_origin(proof.l1_origin_hash, proof.l1_origin_number)?;

        let digest =
            TeeProof::signing_digest(proof.l1_origin_hash, proof.l1_origin_number, journal);
        let signer = self.recovery.recover(digest, &proof.signature)?;

        let registry = self.registry.read().await;
        if !registry.is_valid_proposer(&prover) {
            return Err(VerifierError::InvalidProposer(prover));
        }
        let image = registry
            .signer_image(&signer)
            .ok_or(VerifierError::InvalidSigner(signer))?;
        if image != image_id {
            return Err(VerifierError::ImageMismatch {
                expected: image_id,
                actual: image,
            });
        }

        debug!(target: "tee_verifier", %signer, %prover, %journal, "Verified TEE proof");
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mocks::{mock_sign, MockAttestationValidator, MockSignerRecovery},
        MemoryL1History, SIGNATURE_LEN,
    };
    use alloy_primitives::keccak256;

    const OWNER: Address = Address::repeat_byte(0x01);
    const PROPOSER: Address = Address::repeat_byte(0x0a);
    const SIGNER: Address = Address::repeat_byte(0x5e);
    const JOURNAL: B256 = B256::repeat_byte(0x77);
    const PCR0: &[u8] = b"enclave-image-v1";
    const HEAD: u64 = 10_000;

    type Verifier = TeeVerifier<MockAttestationValidator, MemoryL1History, MockSignerRecovery>;

    async fn verifier() -> (Verifier, B256) {
        let mut registry = SignerRegistry::new(OWNER, OWNER, MockAttestationValidator);
        let image = registry.register_image_fingerprint(OWNER, PCR0).unwrap();
        registry.register_signer_unchecked(OWNER, SIGNER, image).unwrap();
        registry.set_proposer(OWNER, PROPOSER, true).unwrap();

        let l1 = MemoryL1History::with_blocks(HEAD);
        let verifier = TeeVerifier::new(Arc::new(RwLock::new(registry)), l1, MockSignerRecovery);
        (verifier, image)
    }

    fn proof(verifier: &Verifier, signer: Address, number: u64, journal: B256) -> Vec<u8> {
        let l1_origin_hash = verifier.l1().block_hash(number).unwrap_or_default();
        let digest = TeeProof::signing_digest(l1_origin_hash, number, journal);
        TeeProof {
            l1_origin_hash,
            l1_origin_number: number,
            signature: mock_sign(signer, digest),
        }
        .encode()
        .to_vec()
    }

    #[tokio::test]
    async fn verifies_recent_and_historical_origins() {
        let (verifier, image) = verifier().await;
        for number in [HEAD - 1, HEAD - RECENT_BLOCK_WINDOW, HEAD - HISTORY_BLOCK_WINDOW] {
            let proof = proof(&verifier, SIGNER, number, JOURNAL);
            assert!(verifier.verify(&proof, image, JOURNAL, PROPOSER).await.unwrap());
        }
    }

    #[tokio::test]
    async fn rejects_future_and_stale_origins() {
        let (verifier, image) = verifier().await;

        let future = proof(&verifier, SIGNER, HEAD, JOURNAL);
        assert_eq!(
            verifier.verify(&future, image, JOURNAL, PROPOSER).await,
            Err(VerifierError::L1OriginInFuture {
                number: HEAD,
                head: HEAD
            })
        );

        let stale_number = HEAD - HISTORY_BLOCK_WINDOW - 1;
        let stale = proof(&verifier, SIGNER, stale_number, JOURNAL);
        assert_eq!(
            verifier.verify(&stale, image, JOURNAL, PROPOSER).await,
            Err(VerifierError::L1OriginTooOld {
                number: stale_number,
                head: HEAD
            })
        );
    }

    #[tokio::test]
    async fn rejects_forked_origin_hash() {
        let (verifier, image) = verifier().await;
        let number = HEAD - 10;
        let forked = B256::repeat_byte(0xee);
        let digest = TeeProof::signing_digest(forked, number, JOURNAL);
        let proof = TeeProof {
            l1_origin_hash: forked,
            l1_origin_number: number,
            signature: mock_sign(SIGNER, digest),
        }
        .encode();

        assert!(matches!(
            verifier.verify(&proof, image, JOURNAL, PROPOSER).await,
            Err(VerifierError::L1OriginHashMismatch { claimed, .. }) if claimed == forked
        ));
    }

    #[tokio::test]
    async fn rejects_unregistered_signer_and_wrong_image() {
        let (verifier, image) = verifier().await;

        let rogue = Address::repeat_byte(0x66);
        let proof_rogue = proof(&verifier, rogue, HEAD - 1, JOURNAL);
        assert_eq!(
            verifier.verify(&proof_rogue, image, JOURNAL, PROPOSER).await,
            Err(VerifierError::InvalidSigner(rogue))
        );

        let honest = proof(&verifier, SIGNER, HEAD - 1, JOURNAL);
        let other_image = keccak256(b"enclave-image-v2");
        assert_eq!(
            verifier.verify(&honest, other_image, JOURNAL, PROPOSER).await,
            Err(VerifierError::ImageMismatch {
                expected: other_image,
                actual: image
            })
        );
    }

    #[tokio::test]
    async fn rejects_signature_over_other_journal() {
        let (verifier, image) = verifier().await;
        let proof = proof(&verifier, SIGNER, HEAD - 1, JOURNAL);
        assert_eq!(
            verifier.verify(&proof, image, B256::ZERO, PROPOSER).await,
            Err(VerifierError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn rejects_unknown_proposer_and_bad_length() {
        let (verifier, image) = verifier().await;
        let proof = proof(&verifier, SIGNER, HEAD - 1, JOURNAL);
        let stranger = Address::repeat_byte(0x99);
        assert_eq!(
            verifier.verify(&proof, image, JOURNAL, stranger).await,
            Err(VerifierError::InvalidProposer(stranger))
        );
        assert_eq!(
            verifier.verify(&proof[..64 + SIGNATURE_LEN - 1], image, JOURNAL, PROPOSER).await,
            Err(VerifierError::InvalidProofFormat)
        );
    }

    #[tokio::test]
    async fn deregistered_signer_is_rejected() {
        let (verifier, image) = verifier().await;
        verifier
            .registry()
            .write()
            .await
            .deregister_signer(OWNER, SIGNER)
            .unwrap();
        let proof = proof(&verifier, SIGNER, HEAD - 1, JOURNAL);
        assert_eq!(
            verifier.verify(&proof, image, JOURNAL, PROPOSER).await,
            Err(VerifierError::InvalidSigner(SIGNER))
        );
    }
}
