//! This module holds the seams between the dispute game and its collaborators: proof verifiers,
//! the opaque cryptographic services they call into, the anchor registry and the bond escrow.

use crate::{AggregateDisputeState, EscrowError, GameId, RegistryError, VerifierError};
use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::Result;
use multiproof_primitives::{GameType, Proposal};

/// A [ProofVerifier] validates a proof blob against a journal and the image identity the proof
/// must have been produced by.
#[async_trait::async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Verifies `proof` for `journal`.
    ///
    /// ### Takes
    /// - `proof`: The kind-specific proof body.
    /// - `image_id`: The expected enclave image fingerprint or program identifier.
    /// - `journal`: The hash of the public inputs, see [crate::JournalInputs].
    /// - `prover`: The identity submitting the proof.
    ///
    /// ### Returns
    /// - `Ok(true)` if the proof is valid, `Ok(false)` if the backend rejected it, or a typed
    ///   [VerifierError] describing why it could not be checked.
    async fn verify(
        &self,
        proof: &[u8],
        image_id: B256,
        journal: B256,
        prover: Address,
    ) -> Result<bool, VerifierError>;
}

/// Recovers the identity that produced a signature over a digest.
pub trait SignerRecovery: Send + Sync {
    fn recover(&self, digest: B256, signature: &[u8]) -> Result<Address, VerifierError>;
}

/// The external zero-knowledge proof system.
pub trait ZkProofSystem: Send + Sync {
    fn verify(&self, seal: &[u8], image_id: B256, journal: B256) -> Result<bool, VerifierError>;
}

/// The document extracted from a validated enclave attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationDocument {
    /// When the attestation was produced, in milliseconds since the unix epoch.
    pub timestamp_ms: u64,
    /// The raw image measurement (PCR0).
    pub pcr0: Bytes,
    /// The enclave's uncompressed secp256k1 public key.
    pub public_key: Bytes,
}

/// Validates an attestation's certificate chain and extracts its document.
pub trait AttestationValidator: Send + Sync {
    fn validate(
        &self,
        attestation: &[u8],
        proof: &[u8],
    ) -> Result<AttestationDocument, RegistryError>;
}

/// A source of canonical L1 block hashes with two lookup tiers.
pub trait BlockHashSource: Send + Sync {
    /// The number of the current L1 block. Its own hash is not yet available.
    fn head(&self) -> u64;

    /// The cheap lookup, valid for the most recent [crate::RECENT_BLOCK_WINDOW] blocks.
    fn recent_block_hash(&self, number: u64) -> Option<B256>;

    /// The extended history lookup, valid for the most recent
    /// [crate::HISTORY_BLOCK_WINDOW] blocks.
    fn historical_block_hash(&self, number: u64) -> Option<B256>;
}

/// The anchor registry: the latest finalized output plus the validity flags of every game.
pub trait AnchorStateRegistry {
    /// The latest finalized output, the implicit parent of root-level proposals.
    fn anchor_root(&self) -> Proposal;

    /// The game type currently respected for withdrawals.
    fn respected_game_type(&self) -> GameType;

    fn is_game_blacklisted(&self, game: &AggregateDisputeState) -> bool;

    fn is_game_retired(&self, game: &AggregateDisputeState) -> bool;

    /// Whether the game is resolved, airgapped and still valid.
    fn is_game_finalized(&self, game: &AggregateDisputeState, now: u64) -> bool;

    /// Promotes the game's claim to the anchor. May refuse.
    fn set_anchor_state(&mut self, game: &AggregateDisputeState, now: u64) -> Result<()>;
}

/// Holds each game's bond and releases it through an unlock, delay, withdraw sequence.
pub trait BondEscrow {
    fn deposit(&mut self, game: GameId, depositor: Address, value: U256);

    /// Starts the withdrawal delay for `recipient`.
    fn unlock(
        &mut self,
        game: GameId,
        recipient: Address,
        amount: U256,
        now: u64,
    ) -> Result<(), EscrowError>;

    /// Completes the withdrawal. `Ok(false)` means the transfer to `recipient` failed and
    /// nothing changed.
    fn withdraw(
        &mut self,
        game: GameId,
        recipient: Address,
        amount: U256,
        now: u64,
    ) -> Result<bool, EscrowError>;

    /// The timestamp from which an unlocked bond may be withdrawn.
    fn withdrawable_at(&self, game: GameId) -> Option<u64>;
}
