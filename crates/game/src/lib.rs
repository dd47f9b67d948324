//! The multi-proof dispute game: output-root proposals backed by TEE attestations and ZK proofs,
//! challenged and nullified by rival proofs, and resolved under time-locked finality.

extern crate multiproof_primitives;

mod errors;
pub use errors::{EscrowError, GameError, RegistryError, VerifierError};

mod types;
pub use types::{Deadline, GameEvent, GameId};

pub mod config;
pub use config::GameConfig;

mod traits;
pub use traits::{
    AnchorStateRegistry, AttestationDocument, AttestationValidator, BlockHashSource, BondEscrow,
    ProofVerifier, SignerRecovery, ZkProofSystem,
};

mod state;
pub use state::{AggregateDisputeState, BondRecord, ProvingRecord};

mod clock;
pub use clock::FinalityClock;

mod extra_data;
pub use extra_data::ExtraData;

mod proof;
pub use proof::{ProofEnvelope, TeeProof, SIGNATURE_LEN, TEE_PROOF_LEN};

mod journal;
pub use journal::JournalInputs;

mod registry;
pub use registry::{signer_address, SignerRegistry, MAX_ATTESTATION_AGE};

mod verifiers;
pub use verifiers::{
    ProofVerifiers, TeeVerifier, ZkVerifier, HISTORY_BLOCK_WINDOW, RECENT_BLOCK_WINDOW,
};

mod l1;
pub use l1::MemoryL1History;

mod anchor;
pub use anchor::{MemoryAnchorRegistry, ANCHOR_FINALITY_DELAY};

mod escrow;
pub use escrow::{BondPhase, DelayedEscrow, ESCROW_WITHDRAWAL_DELAY};

mod factory;
pub use factory::{CreditClaim, DisputeGameFactory};

mod monitor;
pub use monitor::{GameAction, GameMonitor};

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;
