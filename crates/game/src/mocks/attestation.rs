//! A mock attestation format: `timestamp_ms (8) ‖ pcr0_len (4) ‖ pcr0 ‖ public_key`.

use crate::{AttestationDocument, AttestationValidator, RegistryError};
use alloy_primitives::Bytes;

/// Encodes a mock attestation document.
pub fn attestation(timestamp_ms: u64, pcr0: &[u8], public_key: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(12 + pcr0.len() + public_key.len());
    raw.extend_from_slice(&timestamp_ms.to_be_bytes());
    raw.extend_from_slice(&(pcr0.len() as u32).to_be_bytes());
    raw.extend_from_slice(pcr0);
    raw.extend_from_slice(public_key);
    raw
}

/// Parses attestations built by [attestation]. The certificate chain proof is not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAttestationValidator;

impl AttestationValidator for MockAttestationValidator {
    fn validate(
        &self,
        attestation: &[u8],
        _proof: &[u8],
    ) -> Result<AttestationDocument, RegistryError> {
        let malformed = || RegistryError::InvalidAttestation("truncated document".to_string());
        if attestation.len() < 12 {
            return Err(malformed());
        }

        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&attestation[..8]);
        let mut pcr0_len = [0u8; 4];
        pcr0_len.copy_from_slice(&attestation[8..12]);
        let pcr0_end = 12 + u32::from_be_bytes(pcr0_len) as usize;
        if attestation.len() < pcr0_end {
            return Err(malformed());
        }

        Ok(AttestationDocument {
            timestamp_ms: u64::from_be_bytes(timestamp),
            pcr0: Bytes::from(attestation[12..pcr0_end].to_vec()),
            public_key: Bytes::from(attestation[pcr0_end..].to_vec()),
        })
    }
}
