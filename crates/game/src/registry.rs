//! The signer registry tracks which enclave images are trusted and which signing identities were
//! attested to run them.

use crate::{AttestationValidator, RegistryError};
use alloy_primitives::{keccak256, Address, B256};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Attestations older than this many seconds are refused.
pub const MAX_ATTESTATION_AGE: u64 = 60 * 60;

/// The [SignerRegistry] maps attested signer identities to the image fingerprint they were
/// registered under, and holds the proposer allow-list.
///
/// Image (de)registration and proposer management are restricted to the owner. Signer
/// (de)registration is open to the owner or the manager.
#[derive(Debug)]
pub struct SignerRegistry<V> {
    validator: V,
    owner: Address,
    manager: Address,
    max_attestation_age: u64,
    valid_images: HashSet<B256>,
    signers: HashMap<Address, B256>,
    proposers: HashSet<Address>,
}

impl<V: AttestationValidator> SignerRegistry<V> {
    pub fn new(owner: Address, manager: Address, validator: V) -> Self {
        Self {
            validator,
            owner,
            manager,
            max_attestation_age: MAX_ATTESTATION_AGE,
            valid_images: HashSet::new(),
            signers: HashMap::new(),
            proposers: HashSet::new(),
        }
    }

    pub fn with_max_attestation_age(mut self, seconds: u64) -> Self {
        self.max_attestation_age = seconds;
        self
    }

    pub const fn owner(&self) -> Address {
        self.owner
    }

    pub const fn manager(&self) -> Address {
        self.manager
    }

    pub fn set_manager(&mut self, caller: Address, manager: Address) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        self.manager = manager;
        Ok(())
    }

    /// Marks the fingerprint of a raw image measurement as trusted, returning the fingerprint.
    pub fn register_image_fingerprint(
        &mut self,
        caller: Address,
        pcr0: &[u8],
    ) -> Result<B256, RegistryError> {
        self.only_owner(caller)?;
        let fingerprint = keccak256(pcr0);
        self.valid_images.insert(fingerprint);
        info!(target: "signer_registry", %fingerprint, "Registered image fingerprint");
        Ok(fingerprint)
    }

    /// Revokes trust in an image. Signers registered under it stop being valid.
    pub fn deregister_image_fingerprint(
        &mut self,
        caller: Address,
        pcr0: &[u8],
    ) -> Result<B256, RegistryError> {
        self.only_owner(caller)?;
        let fingerprint = keccak256(pcr0);
        self.valid_images.remove(&fingerprint);
        info!(target: "signer_registry", %fingerprint, "Deregistered image fingerprint");
        Ok(fingerprint)
    }

    pub fn is_valid_image(&self, fingerprint: &B256) -> bool {
        self.valid_images.contains(fingerprint)
    }

    /// Registers the signer attested to by `attestation`.
    ///
    /// ### Takes
    /// - `attestation`: The raw attestation document.
    /// - `proof`: The proof of the attestation's certificate chain, checked by the validator.
    /// - `now`: The current timestamp in seconds.
    ///
    /// ### Returns
    /// - The derived signer identity, or the reason the attestation was refused.
    pub fn register_signer(
        &mut self,
        caller: Address,
        attestation: &[u8],
        proof: &[u8],
        now: u64,
    ) -> Result<Address, RegistryError> {
        self.only_owner_or_manager(caller)?;

        let document = self.validator.validate(attestation, proof)?;
        let timestamp = document.timestamp_ms / 1000;
        if now.saturating_sub(timestamp) >= self.max_attestation_age {
            return Err(RegistryError::AttestationTooOld { timestamp, now });
        }

        let fingerprint = keccak256(&document.pcr0);
        if !self.is_valid_image(&fingerprint) {
            return Err(RegistryError::InvalidFingerprint(fingerprint));
        }

        let signer = signer_address(&document.public_key)?;
        self.signers.insert(signer, fingerprint);
        info!(target: "signer_registry", %signer, %fingerprint, "Registered signer");
        Ok(signer)
    }

    /// Registers a signer without an attestation. Only available to test and simulation builds.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn register_signer_unchecked(
        &mut self,
        caller: Address,
        signer: Address,
        fingerprint: B256,
    ) -> Result<(), RegistryError> {
        self.only_owner_or_manager(caller)?;
        self.signers.insert(signer, fingerprint);
        tracing::warn!(target: "signer_registry", %signer, "Registered signer without attestation");
        Ok(())
    }

    /// Removes a signer. Returns whether it was registered.
    pub fn deregister_signer(
        &mut self,
        caller: Address,
        signer: Address,
    ) -> Result<bool, RegistryError> {
        self.only_owner_or_manager(caller)?;
        let removed = self.signers.remove(&signer).is_some();
        info!(target: "signer_registry", %signer, removed, "Deregistered signer");
        Ok(removed)
    }

    /// Returns the fingerprint a signer is registered under, if its image is still trusted.
    pub fn signer_image(&self, signer: &Address) -> Option<B256> {
        self.signers
            .get(signer)
            .copied()
            .filter(|fingerprint| !fingerprint.is_zero() && self.is_valid_image(fingerprint))
    }

    pub fn is_valid_signer(&self, signer: &Address) -> bool {
        self.signer_image(signer).is_some()
    }

    pub fn set_proposer(
        &mut self,
        caller: Address,
        proposer: Address,
        allowed: bool,
    ) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        if allowed {
            self.proposers.insert(proposer);
        } else {
            self.proposers.remove(&proposer);
        }
        info!(target: "signer_registry", %proposer, allowed, "Updated proposer");
        Ok(())
    }

    pub fn is_valid_proposer(&self, proposer: &Address) -> bool {
        self.proposers.contains(proposer)
    }

    fn only_owner(&self, caller: Address) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::Unauthorized(caller));
        }
        Ok(())
    }

    fn only_owner_or_manager(&self, caller: Address) -> Result<(), RegistryError> {
        if caller != self.owner && caller != self.manager {
            return Err(RegistryError::Unauthorized(caller));
        }
        Ok(())
    }
}

/// Derives the address of an uncompressed (`0x04`-prefixed) secp256k1 public key.
pub fn signer_address(public_key: &[u8]) -> Result<Address, RegistryError> {
    match public_key.split_first() {
        Some((0x04, point)) if point.len() == 64 => {
            Ok(Address::from_slice(&keccak256(point)[12..]))
        }
        _ => Err(RegistryError::InvalidPublicKey),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mocks::{attestation, MockAttestationValidator};
    use alloy_primitives::Bytes;

    const OWNER: Address = Address::repeat_byte(0x01);
    const MANAGER: Address = Address::repeat_byte(0x02);
    const STRANGER: Address = Address::repeat_byte(0x03);
    const PCR0: &[u8] = b"enclave-image-v1";
    const NOW: u64 = 1_700_000_000;

    fn registry() -> SignerRegistry<MockAttestationValidator> {
        SignerRegistry::new(OWNER, MANAGER, MockAttestationValidator)
    }

    fn public_key(byte: u8) -> Bytes {
        let mut key = vec![0x04];
        key.extend_from_slice(&[byte; 64]);
        key.into()
    }

    #[test]
    fn image_registration_is_owner_only() {
        let mut registry = registry();
        assert_eq!(
            registry.register_image_fingerprint(MANAGER, PCR0),
            Err(RegistryError::Unauthorized(MANAGER))
        );
        let fingerprint = registry.register_image_fingerprint(OWNER, PCR0).unwrap();
        assert_eq!(fingerprint, keccak256(PCR0));
        assert!(registry.is_valid_image(&fingerprint));
    }

    #[test]
    fn register_attested_signer() {
        let mut registry = registry();
        let fingerprint = registry.register_image_fingerprint(OWNER, PCR0).unwrap();
        let doc = attestation(NOW * 1000 - 5_000, PCR0, &public_key(7));

        let signer = registry.register_signer(MANAGER, &doc, &[], NOW).unwrap();
        assert_eq!(signer, signer_address(&public_key(7)).unwrap());
        assert_eq!(registry.signer_image(&signer), Some(fingerprint));
        assert!(registry.is_valid_signer(&signer));
    }

    #[test]
    fn register_signer_rejects_stale_attestation() {
        let mut registry = registry();
        registry.register_image_fingerprint(OWNER, PCR0).unwrap();
        let taken_at = NOW - MAX_ATTESTATION_AGE;
        let doc = attestation(taken_at * 1000, PCR0, &public_key(7));
        assert_eq!(
            registry.register_signer(OWNER, &doc, &[], NOW),
            Err(RegistryError::AttestationTooOld {
                timestamp: taken_at,
                now: NOW
            })
        );
    }

    #[test]
    fn register_signer_rejects_unknown_image() {
        let mut registry = registry();
        let doc = attestation(NOW * 1000, b"rogue-image", &public_key(7));
        assert_eq!(
            registry.register_signer(OWNER, &doc, &[], NOW),
            Err(RegistryError::InvalidFingerprint(keccak256(b"rogue-image")))
        );
    }

    #[test]
    fn register_signer_access_and_key_checks() {
        let mut registry = registry();
        registry.register_image_fingerprint(OWNER, PCR0).unwrap();
        let doc = attestation(NOW * 1000, PCR0, &public_key(7));
        assert_eq!(
            registry.register_signer(STRANGER, &doc, &[], NOW),
            Err(RegistryError::Unauthorized(STRANGER))
        );

        let compressed = attestation(NOW * 1000, PCR0, &[0x02; 33]);
        assert_eq!(
            registry.register_signer(OWNER, &compressed, &[], NOW),
            Err(RegistryError::InvalidPublicKey)
        );
    }

    #[test]
    fn deregistration_invalidates_signers() {
        let mut registry = registry();
        registry.register_image_fingerprint(OWNER, PCR0).unwrap();
        let doc = attestation(NOW * 1000, PCR0, &public_key(7));
        let signer = registry.register_signer(OWNER, &doc, &[], NOW).unwrap();

        registry.deregister_image_fingerprint(OWNER, PCR0).unwrap();
        assert!(!registry.is_valid_signer(&signer));

        registry.register_image_fingerprint(OWNER, PCR0).unwrap();
        assert!(registry.is_valid_signer(&signer));
        assert!(registry.deregister_signer(MANAGER, signer).unwrap());
        assert!(!registry.is_valid_signer(&signer));
        assert!(!registry.deregister_signer(MANAGER, signer).unwrap());
    }

    #[test]
    fn zero_fingerprint_means_unregistered() {
        let mut registry = registry();
        registry
            .register_signer_unchecked(OWNER, STRANGER, B256::ZERO)
            .unwrap();
        assert!(!registry.is_valid_signer(&STRANGER));
    }

    #[test]
    fn proposer_allow_list() {
        let mut registry = registry();
        assert_eq!(
            registry.set_proposer(MANAGER, STRANGER, true),
            Err(RegistryError::Unauthorized(MANAGER))
        );
        registry.set_proposer(OWNER, STRANGER, true).unwrap();
        assert!(registry.is_valid_proposer(&STRANGER));
        registry.set_proposer(OWNER, STRANGER, false).unwrap();
        assert!(!registry.is_valid_proposer(&STRANGER));
    }

    #[test]
    fn manager_rotation() {
        let mut registry = registry();
        registry.set_manager(OWNER, STRANGER).unwrap();
        assert_eq!(registry.manager(), STRANGER);
        assert_eq!(
            registry.register_signer_unchecked(MANAGER, MANAGER, B256::ZERO),
            Err(RegistryError::Unauthorized(MANAGER))
        );
    }
}
