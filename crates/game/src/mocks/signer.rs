//! A transparent signature scheme: the "signature" spells out the signer and the digest.

use crate::{SignerRecovery, VerifierError, SIGNATURE_LEN};
use alloy_primitives::{Address, B256};

/// Produces a mock signature by `signer` over `digest`.
pub fn mock_sign(signer: Address, digest: B256) -> [u8; SIGNATURE_LEN] {
    let mut signature = [0u8; SIGNATURE_LEN];
    signature[..20].copy_from_slice(signer.as_slice());
    signature[20..52].copy_from_slice(digest.as_slice());
    signature[64] = 27;
    signature
}

/// Recovers signatures made by [mock_sign]. A signature over a different digest is invalid.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockSignerRecovery;

impl SignerRecovery for MockSignerRecovery {
    fn recover(&self, digest: B256, signature: &[u8]) -> Result<Address, VerifierError> {
        if signature.len() != SIGNATURE_LEN || signature[20..52] != digest[..] {
            return Err(VerifierError::InvalidSignature);
        }
        Ok(Address::from_slice(&signature[..20]))
    }
}
