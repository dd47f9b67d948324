//! A [DisputeGameFactory] wired to in-memory collaborators and mock cryptography, plus builders
//! for honest and dishonest proposals and their proofs.

use super::{mock_sign, MockAttestationValidator, MockProofSystem, MockSignerRecovery};
use crate::{
    BlockHashSource, DelayedEscrow, DisputeGameFactory, ExtraData, GameConfig, GameError, GameId,
    JournalInputs, MemoryAnchorRegistry, MemoryL1History, ProofEnvelope, ProofVerifiers,
    SignerRegistry, TeeProof, TeeVerifier, ZkVerifier,
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use multiproof_primitives::{Claim, GameType, ProofKind, Proposal};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const OWNER: Address = Address::repeat_byte(0x0a);
pub const GUARDIAN: Address = Address::repeat_byte(0x0b);
pub const PROPOSER: Address = Address::repeat_byte(0x01);
pub const CHALLENGER: Address = Address::repeat_byte(0x02);
pub const ENCLAVE_SIGNER: Address = Address::repeat_byte(0xee);

/// The raw measurement of the enclave image trusted by [mock_factory].
pub const ENCLAVE_PCR0: &[u8] = b"multiproof-enclave-image";

/// The L2 sequence number of the initial anchor.
pub const ANCHOR_SEQUENCE_NUMBER: u64 = 6_000;

/// The number of sealed L1 blocks in [mock_factory]'s history.
pub const L1_BLOCKS: u64 = 1_000;

pub type MockTeeVerifier =
    TeeVerifier<MockAttestationValidator, MemoryL1History, MockSignerRecovery>;

pub type MockFactory = DisputeGameFactory<
    MemoryAnchorRegistry,
    DelayedEscrow,
    MockTeeVerifier,
    ZkVerifier<MockProofSystem>,
>;

pub fn test_config() -> GameConfig {
    GameConfig {
        game_type: GameType::AGGREGATE,
        block_interval: 600,
        intermediate_block_interval: 100,
        fast_finality_delay: crate::config::FAST_FINALITY_DELAY,
        slow_finality_delay: crate::config::SLOW_FINALITY_DELAY,
        init_bond: U256::from(1_000_000_000_000_000_000u64),
        config_hash: B256::repeat_byte(0x11),
        tee_image_hash: keccak256(ENCLAVE_PCR0),
        zk_image_hash: B256::repeat_byte(0x33),
    }
}

/// The output the anchor starts at.
pub fn anchor_proposal() -> Proposal {
    Proposal::new(checkpoint_root(0, ANCHOR_SEQUENCE_NUMBER), ANCHOR_SEQUENCE_NUMBER)
}

/// Builds a factory whose signer registry trusts [ENCLAVE_SIGNER] and allows [PROPOSER] and
/// [CHALLENGER] to submit TEE proofs.
pub fn mock_factory() -> anyhow::Result<MockFactory> {
    let config = test_config();

    let mut registry = SignerRegistry::new(OWNER, OWNER, MockAttestationValidator);
    let fingerprint = registry.register_image_fingerprint(OWNER, ENCLAVE_PCR0)?;
    registry.register_signer_unchecked(OWNER, ENCLAVE_SIGNER, fingerprint)?;
    registry.set_proposer(OWNER, PROPOSER, true)?;
    registry.set_proposer(OWNER, CHALLENGER, true)?;

    let tee = TeeVerifier::new(
        Arc::new(RwLock::new(registry)),
        MemoryL1History::with_blocks(L1_BLOCKS),
        MockSignerRecovery,
    );
    let anchor = MemoryAnchorRegistry::new(GUARDIAN, anchor_proposal(), config.game_type);

    DisputeGameFactory::new(
        config,
        anchor,
        DelayedEscrow::default(),
        ProofVerifiers::new(tee, ZkVerifier::new(MockProofSystem)),
    )
}

/// The output root a chain labelled `chain` commits to at L2 block `sequence_number`. Chain `0`
/// is the canonical one.
pub fn checkpoint_root(chain: u8, sequence_number: u64) -> Claim {
    keccak256([&[chain][..], &sequence_number.to_be_bytes()].concat())
}

/// A proposal built on `starting`, with every checkpoint taken from one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProposal {
    pub starting: Proposal,
    pub parent: Option<GameId>,
    pub l2_sequence_number: u64,
    pub intermediate_roots: Vec<Claim>,
}

impl MockProposal {
    pub fn new(config: &GameConfig, starting: Proposal, parent: Option<GameId>, chain: u8) -> Self {
        let intermediate_roots = (1..=config.intermediate_root_count() as u64)
            .map(|i| {
                checkpoint_root(
                    chain,
                    starting.l2_sequence_number + i * config.intermediate_block_interval,
                )
            })
            .collect();
        Self {
            starting,
            parent,
            l2_sequence_number: starting.l2_sequence_number + config.block_interval,
            intermediate_roots,
        }
    }

    /// Builds on the anchor.
    pub fn on_anchor(chain: u8) -> Self {
        Self::new(&test_config(), anchor_proposal(), None, chain)
    }

    /// Builds on the proposal of game `parent`.
    pub fn on_parent(parent: GameId, parent_proposal: &MockProposal, chain: u8) -> Self {
        Self::new(&test_config(), parent_proposal.ending(), Some(parent), chain)
    }

    pub fn root_claim(&self) -> Claim {
        self.intermediate_roots.last().copied().unwrap_or_default()
    }

    pub fn ending(&self) -> Proposal {
        Proposal::new(self.root_claim(), self.l2_sequence_number)
    }

    pub fn extra_data(&self) -> Bytes {
        ExtraData::new(
            self.l2_sequence_number,
            self.parent,
            self.intermediate_roots.clone(),
        )
        .encode()
    }

    /// The journal `prover` commits to when proving the whole proposal with `kind`.
    pub fn journal(&self, config: &GameConfig, prover: Address, kind: ProofKind) -> JournalInputs {
        JournalInputs {
            prover,
            starting: self.starting,
            ending: self.ending(),
            intermediate_roots: self.intermediate_roots.clone(),
            config_hash: config.config_hash,
            image_hash: config.image_hash(kind),
        }
    }

    /// The journal `prover` commits to when claiming `proposed_root` for segment `index`.
    pub fn nullify_journal(
        &self,
        config: &GameConfig,
        prover: Address,
        kind: ProofKind,
        index: usize,
        proposed_root: Claim,
    ) -> JournalInputs {
        let interval = config.intermediate_block_interval;
        let starting = match index.checked_sub(1) {
            Some(previous) => Proposal::new(
                self.intermediate_roots[previous],
                self.starting.l2_sequence_number + interval * index as u64,
            ),
            None => self.starting,
        };
        JournalInputs {
            prover,
            starting,
            ending: Proposal::new(
                proposed_root,
                self.starting.l2_sequence_number + interval * (index as u64 + 1),
            ),
            intermediate_roots: vec![proposed_root],
            config_hash: config.config_hash,
            image_hash: config.image_hash(kind),
        }
    }
}

/// Signs `journal` with [ENCLAVE_SIGNER], bound to the newest sealed block of `l1`.
pub fn tee_proof(l1: &MemoryL1History, journal: &JournalInputs) -> Bytes {
    let number = l1.head().saturating_sub(1);
    let hash = l1.block_hash(number).unwrap_or_default();
    let digest = TeeProof::signing_digest(hash, number, journal.journal());
    let body = TeeProof {
        l1_origin_hash: hash,
        l1_origin_number: number,
        signature: mock_sign(ENCLAVE_SIGNER, digest),
    };
    ProofEnvelope::new(ProofKind::Tee, body.encode()).encode()
}

pub fn zk_proof(journal: &JournalInputs) -> Bytes {
    let seal = MockProofSystem::prove(journal.image_hash, journal.journal());
    ProofEnvelope::new(ProofKind::Zk, seal).encode()
}

/// Produces a valid proof of `kind` for `journal` against `factory`'s verifiers.
pub fn proof_for(factory: &MockFactory, kind: ProofKind, journal: &JournalInputs) -> Bytes {
    match kind {
        ProofKind::Tee => tee_proof(factory.verifiers().tee.l1(), journal),
        ProofKind::Zk => zk_proof(journal),
    }
}

/// Creates a game for `proposal` proven with `kind` by `proposer`, escrowing the configured bond.
pub async fn propose(
    factory: &mut MockFactory,
    proposer: Address,
    proposal: &MockProposal,
    kind: ProofKind,
    now: u64,
) -> Result<GameId, GameError> {
    let config = factory.config().clone();
    let proof = proof_for(factory, kind, &proposal.journal(&config, proposer, kind));
    factory
        .create(
            proposer,
            config.game_type,
            proposal.root_claim(),
            proposal.extra_data(),
            &proof,
            config.init_bond,
            now,
        )
        .await
}
