//! Typed failures for every operation exposed by the game crate.
//!
//! Each operation either commits its whole state transition or fails with one of these errors
//! and leaves all state untouched.

use crate::GameId;
use alloy_primitives::{Address, B256, U256};
use multiproof_primitives::{GameType, ProofKind};
use thiserror::Error;

/// Failures raised while verifying a proof blob against a journal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierError {
    #[error("malformed proof bytes")]
    InvalidProofFormat,
    #[error("signature could not be recovered")]
    InvalidSignature,
    #[error("signer {0} is not registered")]
    InvalidSigner(Address),
    #[error("signer image {actual} does not match expected image {expected}")]
    ImageMismatch { expected: B256, actual: B256 },
    #[error("prover {0} is not an allowed proposer")]
    InvalidProposer(Address),
    #[error("L1 origin block {number} is not older than the L1 head {head}")]
    L1OriginInFuture { number: u64, head: u64 },
    #[error("L1 origin block {number} is outside the block hash lookback window of head {head}")]
    L1OriginTooOld { number: u64, head: u64 },
    #[error("L1 origin hash {claimed} does not match canonical hash {actual}")]
    L1OriginHashMismatch { claimed: B256, actual: B256 },
    #[error("proof system failure: {0}")]
    ProofSystem(String),
}

/// Failures raised by the signer registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("caller {0} is not authorized for this operation")]
    Unauthorized(Address),
    #[error("image fingerprint {0} is not registered")]
    InvalidFingerprint(B256),
    #[error("attestation taken at {timestamp} is too old at {now}")]
    AttestationTooOld { timestamp: u64, now: u64 },
    #[error("attestation rejected: {0}")]
    InvalidAttestation(String),
    #[error("attested public key is not an uncompressed secp256k1 key")]
    InvalidPublicKey,
}

/// Failures raised by the bond escrow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    #[error("no bond is held for game {0}")]
    UnknownBond(GameId),
    #[error("bond for game {0} has not been unlocked for this recipient and amount")]
    NotUnlocked(GameId),
    #[error("bond for game {game} is already unlocking")]
    AlreadyUnlocked { game: GameId },
    #[error("bond for game {game} cannot be withdrawn before {ready_at}")]
    WithdrawalDelayNotElapsed { game: GameId, ready_at: u64 },
    #[error("requested amount exceeds the bond held for game {0}")]
    InsufficientBond(GameId),
    #[error("bond for game {0} was already withdrawn")]
    AlreadyClaimed(GameId),
}

/// Failures raised by the dispute game state machine and its factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game {0} does not exist")]
    UnknownGame(GameId),
    #[error("game type {0} is not served by this factory")]
    UnknownGameType(GameType),
    #[error("a game with UUID {0} already exists")]
    GameAlreadyExists(B256),
    #[error("bond of {actual} does not match the required bond of {expected}")]
    IncorrectBondAmount { expected: U256, actual: U256 },
    #[error("game is already initialized")]
    AlreadyInitialized,
    #[error("extra data has an unexpected length")]
    BadExtraData,
    #[error("last intermediate root does not match the root claim")]
    IntermediateRootMismatch,
    #[error("parent game is not a valid starting point")]
    InvalidParentGame,
    #[error("expected L2 sequence number {expected}, got {actual}")]
    UnexpectedBlockNumber { expected: u64, actual: u64 },
    #[error("unknown proof type {0}")]
    InvalidProofType(u8),
    #[error("proof is empty")]
    EmptyProof,
    #[error("{0} proof was rejected by its verifier")]
    InvalidProof(ProofKind),
    #[error(transparent)]
    Verifier(#[from] VerifierError),
    #[error("no proof has been provided")]
    NoProofProvided,
    #[error("the game deadline has passed")]
    GameOver,
    #[error("the game deadline has not passed")]
    GameNotOver,
    #[error("{0} proof already provided")]
    AlreadyProven(ProofKind),
    #[error("{0} proof is missing")]
    MissingProof(ProofKind),
    #[error("the game is not a valid target for this operation")]
    InvalidGame,
    #[error("intermediate root index {0} is out of bounds")]
    InvalidIntermediateRootIndex(usize),
    #[error("proposed intermediate root equals the recorded root")]
    IntermediateRootSameAsProposed,
    #[error("the game has already been resolved")]
    ClaimAlreadyResolved,
    #[error("the parent game has not been resolved")]
    ParentGameNotResolved,
    #[error("the game is not resolved")]
    GameNotResolved,
    #[error("the game is not finalized")]
    GameNotFinalized,
    #[error("the countering game has not been resolved")]
    CounteredByGameNotResolved,
    #[error("the factory holds the maximum number of games")]
    TooManyGames,
    #[error("no credit to claim")]
    NoCreditToClaim,
    #[error("bond recipient has not been determined")]
    BondRecipientEmpty,
    #[error("bond transfer to the recipient failed")]
    BondTransferFailed,
    #[error(transparent)]
    Escrow(#[from] EscrowError),
}
