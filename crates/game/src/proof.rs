//! Decoding of the proof blobs attached to games.
//!
//! Every proof starts with a one byte [ProofKind] tag followed by a kind-specific body. A TEE
//! body is `l1_origin_hash (32) ‖ l1_origin_number (32, big-endian) ‖ signature (65)`; a ZK body
//! is an opaque seal handed to the external proof system.

use crate::{GameError, VerifierError};
use alloy_primitives::{keccak256, Bytes, B256, U256};
use multiproof_primitives::ProofKind;

/// The length of a recoverable secp256k1 signature.
pub const SIGNATURE_LEN: usize = 65;

/// The exact length of a TEE proof body.
pub const TEE_PROOF_LEN: usize = 32 + 32 + SIGNATURE_LEN;

/// A proof split into its kind and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofEnvelope {
    pub kind: ProofKind,
    pub body: Bytes,
}

impl ProofEnvelope {
    pub fn new(kind: ProofKind, body: impl Into<Bytes>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    /// Splits a raw proof into its kind tag and body.
    pub fn decode(raw: &[u8]) -> Result<Self, GameError> {
        let (&tag, body) = raw.split_first().ok_or(GameError::EmptyProof)?;
        let kind = ProofKind::try_from(tag).map_err(|_| GameError::InvalidProofType(tag))?;
        Ok(Self {
            kind,
            body: Bytes::from(body.to_vec()),
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut raw = Vec::with_capacity(1 + self.body.len());
        raw.push(self.kind as u8);
        raw.extend_from_slice(&self.body);
        raw.into()
    }
}

/// The decoded body of a TEE proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeeProof {
    /// The hash of the L1 block the enclave derived the L2 chain from.
    pub l1_origin_hash: B256,
    /// The number of that L1 block.
    pub l1_origin_number: u64,
    /// The enclave's signature over [TeeProof::signing_digest].
    pub signature: [u8; SIGNATURE_LEN],
}

impl TeeProof {
    pub fn decode(body: &[u8]) -> Result<Self, VerifierError> {
        if body.len() != TEE_PROOF_LEN {
            return Err(VerifierError::InvalidProofFormat);
        }

        let l1_origin_hash = B256::from_slice(&body[..32]);
        let l1_origin_number = u64::try_from(U256::from_be_slice(&body[32..64]))
            .map_err(|_| VerifierError::InvalidProofFormat)?;
        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&body[64..]);

        Ok(Self {
            l1_origin_hash,
            l1_origin_number,
            signature,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut raw = Vec::with_capacity(TEE_PROOF_LEN);
        raw.extend_from_slice(self.l1_origin_hash.as_slice());
        raw.extend_from_slice(&U256::from(self.l1_origin_number).to_be_bytes::<32>());
        raw.extend_from_slice(&self.signature);
        raw.into()
    }

    /// The digest the enclave signs, binding the journal to the L1 origin it was derived from.
    pub fn signing_digest(l1_origin_hash: B256, l1_origin_number: u64, journal: B256) -> B256 {
        let mut preimage = Vec::with_capacity(96);
        preimage.extend_from_slice(l1_origin_hash.as_slice());
        preimage.extend_from_slice(&U256::from(l1_origin_number).to_be_bytes::<32>());
        preimage.extend_from_slice(journal.as_slice());
        keccak256(preimage)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn envelope_kinds() {
        let zk = ProofEnvelope::new(ProofKind::Zk, vec![0xaa, 0xbb]);
        let raw = zk.encode();
        assert_eq!(raw[0], 1);
        assert_eq!(ProofEnvelope::decode(&raw).unwrap(), zk);

        assert_eq!(ProofEnvelope::decode(&[]), Err(GameError::EmptyProof));
        assert_eq!(
            ProofEnvelope::decode(&[7, 1, 2]),
            Err(GameError::InvalidProofType(7))
        );
    }

    #[test]
    fn tee_body_layout() {
        let proof = TeeProof {
            l1_origin_hash: B256::repeat_byte(0x42),
            l1_origin_number: 1_024,
            signature: [9u8; SIGNATURE_LEN],
        };
        let raw = proof.encode();
        assert_eq!(raw.len(), TEE_PROOF_LEN);
        assert_eq!(&raw[62..64], &[0x04, 0x00]);
        assert_eq!(TeeProof::decode(&raw).unwrap(), proof);
    }

    #[test]
    fn tee_body_rejects_bad_length() {
        let raw = vec![0u8; TEE_PROOF_LEN - 1];
        assert_eq!(TeeProof::decode(&raw), Err(VerifierError::InvalidProofFormat));
        let raw = vec![0u8; TEE_PROOF_LEN + 1];
        assert_eq!(TeeProof::decode(&raw), Err(VerifierError::InvalidProofFormat));
    }

    #[test]
    fn signing_digest_binds_origin() {
        let journal = B256::repeat_byte(1);
        let base = TeeProof::signing_digest(B256::ZERO, 10, journal);
        assert_ne!(base, TeeProof::signing_digest(B256::ZERO, 11, journal));
        assert_ne!(base, TeeProof::signing_digest(B256::repeat_byte(2), 10, journal));
        assert_ne!(base, TeeProof::signing_digest(B256::ZERO, 10, B256::ZERO));
    }
}
