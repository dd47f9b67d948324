//! Implementations of the [crate::ProofVerifier] trait, one per [ProofKind].

mod tee;
pub use self::tee::{TeeVerifier, HISTORY_BLOCK_WINDOW, RECENT_BLOCK_WINDOW};

mod zk;
pub use self::zk::ZkVerifier;

use crate::{ProofVerifier, VerifierError};
use alloy_primitives::{Address, B256};
use multiproof_primitives::ProofKind;

/// The [ProofVerifiers] struct pairs one verifier per [ProofKind] and dispatches on the kind tag
/// of incoming proofs.
#[derive(Debug)]
pub struct ProofVerifiers<T, Z> {
    pub tee: T,
    pub zk: Z,
}

impl<T, Z> ProofVerifiers<T, Z>
where
    T: ProofVerifier,
    Z: ProofVerifier,
{
    pub const fn new(tee: T, zk: Z) -> Self {
        Self { tee, zk }
    }

    /// Verifies `proof` with the verifier registered for `kind`.
    pub async fn verify(
        &self,
        kind: ProofKind,
        proof: &[u8],
        image_id: B256,
        journal: B256,
        prover: Address,
    ) -> Result<bool, VerifierError> {
        match kind {
            ProofKind::Tee => self.tee.verify(proof, image_id, journal, prover).await,
            ProofKind::Zk => self.zk.verify(proof, image_id, journal, prover).await,
        }
    }
}
