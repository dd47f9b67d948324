//! This module contains the in-memory representation of a single aggregate dispute game.

use crate::{Deadline, GameError, GameId};
use alloy_primitives::{Address, Bytes, B256, U256};
use multiproof_primitives::{Claim, DisputeGame, GameStatus, GameType, ProofKind, Proposal};

/// The [ProvingRecord] maps each [ProofKind] to the identity that supplied it. An entry, once
/// written, is never overwritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvingRecord([Option<Address>; ProofKind::ALL.len()]);

impl ProvingRecord {
    pub const fn prover(&self, kind: ProofKind) -> Option<Address> {
        self.0[kind.index()]
    }

    pub const fn has(&self, kind: ProofKind) -> bool {
        self.0[kind.index()].is_some()
    }

    /// Records `prover` for `kind`, failing if the kind is already on record.
    pub fn record(&mut self, kind: ProofKind, prover: Address) -> Result<(), GameError> {
        let slot = &mut self.0[kind.index()];
        if slot.is_some() {
            return Err(GameError::AlreadyProven(kind));
        }
        *slot = Some(prover);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|p| p.is_some()).count()
    }

    pub const fn capacity(&self) -> usize {
        ProofKind::ALL.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Bookkeeping for the bond a game's creator escrowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BondRecord {
    pub amount: U256,
    /// Who the bond is released to. Unset until an outcome is known.
    pub recipient: Option<Address>,
    pub unlocked: bool,
    pub claimed: bool,
}

/// The [AggregateDisputeState] struct holds a single proposal's dispute state: its identity,
/// lifecycle timestamps, the proofs backing it and its bond.
#[derive(Debug, Clone)]
pub struct AggregateDisputeState {
    pub(crate) id: GameId,
    pub(crate) uuid: B256,
    pub(crate) game_type: GameType,
    pub(crate) root_claim: Claim,
    pub(crate) extra_data: Bytes,
    pub(crate) l2_sequence_number: u64,
    /// The game this proposal builds on. [None] when it builds on the anchor.
    pub(crate) parent: Option<GameId>,
    pub(crate) creator: Address,
    pub(crate) initialized: bool,
    pub(crate) status: GameStatus,
    pub(crate) created_at: u64,
    pub(crate) resolved_at: Option<u64>,
    pub(crate) deadline: Deadline,
    pub(crate) proving: ProvingRecord,
    /// The agreed-upon output this proposal's transition starts from.
    pub(crate) starting: Proposal,
    /// Checkpoints every intermediate block interval. The last one is the root claim.
    pub(crate) intermediate_roots: Vec<Claim>,
    pub(crate) bond: BondRecord,
    /// The rival game whose challenge this game lost, if any.
    pub(crate) countered_by: Option<GameId>,
    /// Whether the game type was the anchor's respected type when this game was created.
    pub(crate) was_respected: bool,
}

impl AggregateDisputeState {
    /// Creates an uninitialized game. Its provenance fields are filled in by initialization.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: GameId,
        uuid: B256,
        game_type: GameType,
        root_claim: Claim,
        extra_data: Bytes,
        l2_sequence_number: u64,
        parent: Option<GameId>,
        intermediate_roots: Vec<Claim>,
        creator: Address,
    ) -> Self {
        Self {
            id,
            uuid,
            game_type,
            root_claim,
            extra_data,
            l2_sequence_number,
            parent,
            creator,
            initialized: false,
            status: GameStatus::InProgress,
            created_at: 0,
            resolved_at: None,
            deadline: Deadline::NEVER,
            proving: ProvingRecord::default(),
            starting: Proposal::default(),
            intermediate_roots,
            bond: BondRecord::default(),
            countered_by: None,
            was_respected: false,
        }
    }

    pub const fn id(&self) -> GameId {
        self.id
    }

    pub const fn uuid(&self) -> B256 {
        self.uuid
    }

    pub fn extra_data(&self) -> &Bytes {
        &self.extra_data
    }

    pub const fn parent(&self) -> Option<GameId> {
        self.parent
    }

    pub const fn creator(&self) -> Address {
        self.creator
    }

    pub const fn deadline(&self) -> Deadline {
        self.deadline
    }

    pub const fn proving(&self) -> &ProvingRecord {
        &self.proving
    }

    pub const fn prover(&self, kind: ProofKind) -> Option<Address> {
        self.proving.prover(kind)
    }

    pub const fn starting(&self) -> Proposal {
        self.starting
    }

    pub fn intermediate_roots(&self) -> &[Claim] {
        &self.intermediate_roots
    }

    pub const fn bond(&self) -> &BondRecord {
        &self.bond
    }

    pub const fn bond_recipient(&self) -> Option<Address> {
        self.bond.recipient
    }

    pub const fn countered_by(&self) -> Option<GameId> {
        self.countered_by
    }

    pub const fn was_respected(&self) -> bool {
        self.was_respected
    }

    pub const fn proposal(&self) -> Proposal {
        Proposal::new(self.root_claim, self.l2_sequence_number)
    }

    /// Returns the output the segment ending at intermediate root `index` starts from: the
    /// previous checkpoint, or the game's starting output for the first segment.
    pub fn segment_start(&self, index: usize, intermediate_block_interval: u64) -> Proposal {
        match index.checked_sub(1) {
            Some(previous) => Proposal::new(
                self.intermediate_roots[previous],
                self.starting.l2_sequence_number + intermediate_block_interval * index as u64,
            ),
            None => self.starting,
        }
    }
}

impl DisputeGame for AggregateDisputeState {
    fn game_type(&self) -> GameType {
        self.game_type
    }

    fn root_claim(&self) -> Claim {
        self.root_claim
    }

    fn l2_sequence_number(&self) -> u64 {
        self.l2_sequence_number
    }

    fn status(&self) -> &GameStatus {
        &self.status
    }

    fn created_at(&self) -> u64 {
        self.created_at
    }

    fn resolved_at(&self) -> Option<u64> {
        self.resolved_at
    }
}
