//! The [DisputeGameFactory] owns every aggregate dispute game and drives their transitions:
//! creation and initialization, proof submission, challenge, nullification, resolution, bond
//! settlement and anchor promotion.
//!
//! Games reference their parent and rival by [GameId] into the factory's arena. Every operation
//! takes the caller identity and the current timestamp as explicit inputs, validates completely,
//! then commits. A failed operation leaves the arena, the escrow and the anchor untouched.

use crate::{
    AggregateDisputeState, AnchorStateRegistry, BondEscrow, Deadline, ExtraData, FinalityClock,
    GameConfig, GameError, GameEvent, GameId, JournalInputs, ProofEnvelope, ProofVerifier,
    ProofVerifiers, ProvingRecord,
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use multiproof_primitives::{
    chain_rules, Claim, DisputeGame, GameStatus, GameType, ProofKind, Proposal,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The result of a successful [DisputeGameFactory::claim_credit] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditClaim {
    /// The bond was unlocked in the escrow. A second call after the escrow delay withdraws it.
    Unlocked { recipient: Address, amount: U256 },
    /// The bond was paid out.
    Claimed { recipient: Address, amount: U256 },
}

/// The state changes an initialization commits once every check has passed.
struct Initialization {
    starting: Proposal,
    kind: ProofKind,
    proving: ProvingRecord,
    was_respected: bool,
}

/// The [DisputeGameFactory] is the arena of [AggregateDisputeState]s together with the
/// collaborators their transitions consult.
pub struct DisputeGameFactory<A, E, T, Z> {
    config: GameConfig,
    clock: FinalityClock,
    anchor: A,
    escrow: E,
    verifiers: ProofVerifiers<T, Z>,
    games: Vec<AggregateDisputeState>,
    uuids: HashMap<B256, GameId>,
    events: Vec<GameEvent>,
}

impl<A, E, T, Z> DisputeGameFactory<A, E, T, Z>
where
    A: AnchorStateRegistry,
    E: BondEscrow,
    T: ProofVerifier,
    Z: ProofVerifier,
{
    pub fn new(
        config: GameConfig,
        anchor: A,
        escrow: E,
        verifiers: ProofVerifiers<T, Z>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            clock: FinalityClock::from_config(&config),
            config,
            anchor,
            escrow,
            verifiers,
            games: Vec::new(),
            uuids: HashMap::new(),
            events: Vec::new(),
        })
    }

    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    pub const fn anchor(&self) -> &A {
        &self.anchor
    }

    pub fn anchor_mut(&mut self) -> &mut A {
        &mut self.anchor
    }

    pub const fn escrow(&self) -> &E {
        &self.escrow
    }

    pub fn escrow_mut(&mut self) -> &mut E {
        &mut self.escrow
    }

    pub const fn verifiers(&self) -> &ProofVerifiers<T, Z> {
        &self.verifiers
    }

    pub fn verifiers_mut(&mut self) -> &mut ProofVerifiers<T, Z> {
        &mut self.verifiers
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn games(&self) -> impl Iterator<Item = &AggregateDisputeState> {
        self.games.iter()
    }

    /// Returns the game at a positional index.
    pub fn game_at_index(&self, index: u32) -> Option<&AggregateDisputeState> {
        self.games.get(index as usize)
    }

    pub fn game(&self, id: GameId) -> Result<&AggregateDisputeState, GameError> {
        self.games.get(id.as_usize()).ok_or(GameError::UnknownGame(id))
    }

    /// Looks up a game by the inputs its UUID is derived from.
    pub fn find_game(
        &self,
        game_type: GameType,
        root_claim: Claim,
        extra_data: &[u8],
    ) -> Option<GameId> {
        self.uuids
            .get(&Self::game_uuid(game_type, root_claim, extra_data))
            .copied()
    }

    /// The events emitted so far.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// `keccak256(game_type ‖ root_claim ‖ extra_data)`.
    pub fn game_uuid(game_type: GameType, root_claim: Claim, extra_data: &[u8]) -> B256 {
        keccak256([&game_type.to_be_bytes()[..], root_claim.as_slice(), extra_data].concat())
    }

    /// Whether a game may serve as a parent or a challenger: created with the respected type,
    /// neither blacklisted nor retired, and not lost.
    pub fn is_valid(&self, game: &AggregateDisputeState) -> bool {
        game.was_respected()
            && !self.anchor.is_game_blacklisted(game)
            && !self.anchor.is_game_retired(game)
            && *game.status() != GameStatus::ChallengerWins
    }

    /// The outcome a child inherits from its parent: no parent counts as a defender win, an
    /// invalidated parent as a challenger win.
    pub fn parent_status(&self, game: &AggregateDisputeState) -> Result<GameStatus, GameError> {
        let Some(parent) = game.parent() else {
            return Ok(GameStatus::DefenderWins);
        };
        let parent = self.game(parent)?;
        if self.anchor.is_game_blacklisted(parent) || self.anchor.is_game_retired(parent) {
            return Ok(GameStatus::ChallengerWins);
        }
        Ok(*parent.status())
    }

    /// Computes the status [Self::resolve] would commit at `now`, without committing it.
    pub fn resolution(&self, id: GameId, now: u64) -> Result<GameStatus, GameError> {
        let game = self.game(id)?;
        if *game.status() != GameStatus::InProgress {
            return Err(GameError::ClaimAlreadyResolved);
        }

        match self.parent_status(game)? {
            GameStatus::ChallengerWins => Ok(GameStatus::ChallengerWins),
            GameStatus::InProgress => Err(GameError::ParentGameNotResolved),
            GameStatus::DefenderWins if !game.deadline().has_passed(now) => {
                Err(GameError::GameNotOver)
            }
            GameStatus::DefenderWins => Ok(GameStatus::DefenderWins),
        }
    }

    /// Creates a game for `root_claim` and initializes it with `proof`.
    ///
    /// ### Takes
    /// - `creator`: The proposer creating the game. Their identity is committed to the journal.
    /// - `game_type`: Must be the configured game type.
    /// - `root_claim`: The claimed output root.
    /// - `extra_data`: The encoded [ExtraData].
    /// - `proof`: The initial proof envelope.
    /// - `bond`: The value escrowed with the game. Must equal the configured bond.
    /// - `now`: The current timestamp.
    ///
    /// ### Returns
    /// - The [GameId] of the new game, or why it could not be created.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &mut self,
        creator: Address,
        game_type: GameType,
        root_claim: Claim,
        extra_data: Bytes,
        proof: &[u8],
        bond: U256,
        now: u64,
    ) -> Result<GameId, GameError> {
        if game_type != self.config.game_type {
            return Err(GameError::UnknownGameType(game_type));
        }
        if bond != self.config.init_bond {
            return Err(GameError::IncorrectBondAmount {
                expected: self.config.init_bond,
                actual: bond,
            });
        }
        let uuid = Self::game_uuid(game_type, root_claim, &extra_data);
        if self.uuids.contains_key(&uuid) {
            return Err(GameError::GameAlreadyExists(uuid));
        }

        let decoded = ExtraData::decode(&extra_data, &self.config)?;
        let id = GameId::from_index(self.games.len()).ok_or(GameError::TooManyGames)?;
        let mut game = AggregateDisputeState::new(
            id,
            uuid,
            game_type,
            root_claim,
            extra_data,
            decoded.l2_sequence_number,
            decoded.parent,
            decoded.intermediate_roots,
            creator,
        );

        let init = self.prepare_initialization(&game, proof).await?;
        let proved = self.commit_initialization(&mut game, init, bond, now)?;

        self.uuids.insert(uuid, id);
        self.games.push(game);
        self.emit(GameEvent::Created {
            game: id,
            uuid,
            root_claim,
            creator,
        });
        self.emit(proved);
        Ok(id)
    }

    /// Initializes a game. Games are initialized by [Self::create], so this is only a guard
    /// against re-initialization: on any game in the arena it fails with
    /// [GameError::AlreadyInitialized].
    pub async fn initialize(
        &mut self,
        id: GameId,
        proof: &[u8],
        bond: U256,
        now: u64,
    ) -> Result<(), GameError> {
        let game = self.game(id)?;
        if game.initialized {
            return Err(GameError::AlreadyInitialized);
        }

        let init = self.prepare_initialization(game, proof).await?;
        let mut game = game.clone();
        let proved = self.commit_initialization(&mut game, init, bond, now)?;
        self.games[id.as_usize()] = game;
        self.emit(proved);
        Ok(())
    }

    async fn prepare_initialization(
        &self,
        game: &AggregateDisputeState,
        proof: &[u8],
    ) -> Result<Initialization, GameError> {
        if game.intermediate_roots().last() != Some(&game.root_claim()) {
            return Err(GameError::IntermediateRootMismatch);
        }

        let starting = match game.parent() {
            Some(parent) => {
                let parent = self
                    .games
                    .get(parent.as_usize())
                    .ok_or(GameError::InvalidParentGame)?;
                if parent.game_type() != game.game_type() || !self.is_valid(parent) {
                    return Err(GameError::InvalidParentGame);
                }
                parent.proposal()
            }
            None => self.anchor.anchor_root(),
        };

        let expected = starting.l2_sequence_number + self.config.block_interval;
        if game.l2_sequence_number() != expected {
            return Err(GameError::UnexpectedBlockNumber {
                expected,
                actual: game.l2_sequence_number(),
            });
        }

        let envelope = ProofEnvelope::decode(proof)?;
        self.verify_transition(
            &envelope,
            game.creator(),
            starting,
            game.proposal(),
            game.intermediate_roots().to_vec(),
        )
        .await?;

        let mut proving = *game.proving();
        proving.record(envelope.kind, game.creator())?;

        Ok(Initialization {
            starting,
            kind: envelope.kind,
            proving,
            was_respected: self.anchor.respected_game_type() == game.game_type(),
        })
    }

    fn commit_initialization(
        &mut self,
        game: &mut AggregateDisputeState,
        init: Initialization,
        bond: U256,
        now: u64,
    ) -> Result<GameEvent, GameError> {
        game.deadline = self.clock.update_deadline(&init.proving, Deadline::NEVER, now)?;
        game.proving = init.proving;
        game.starting = init.starting;
        game.was_respected = init.was_respected;
        game.created_at = now;
        game.initialized = true;
        game.bond.amount = bond;
        self.escrow.deposit(game.id, game.creator, bond);

        info!(
            target: "dispute_game",
            game = %game.id,
            root_claim = %game.root_claim,
            l2_sequence_number = game.l2_sequence_number,
            kind = %init.kind,
            deadline = %game.deadline,
            "Initialized game"
        );
        Ok(GameEvent::Proved {
            game: game.id,
            kind: init.kind,
            prover: game.creator,
            deadline: game.deadline,
        })
    }

    /// Adds a proof of a kind the game does not hold yet, proven by `caller`.
    pub async fn submit_proof(
        &mut self,
        id: GameId,
        caller: Address,
        proof: &[u8],
        now: u64,
    ) -> Result<Deadline, GameError> {
        let game = self.game(id)?;
        if *game.status() != GameStatus::InProgress {
            return Err(GameError::ClaimAlreadyResolved);
        }
        if game.deadline().has_passed(now) {
            return Err(GameError::GameOver);
        }

        let envelope = ProofEnvelope::decode(proof)?;
        let mut proving = *game.proving();
        proving.record(envelope.kind, caller)?;

        self.verify_transition(
            &envelope,
            caller,
            game.starting(),
            game.proposal(),
            game.intermediate_roots().to_vec(),
        )
        .await?;
        let deadline = self.clock.update_deadline(&proving, game.deadline(), now)?;

        let game = &mut self.games[id.as_usize()];
        game.proving = proving;
        game.deadline = deadline;
        info!(
            target: "dispute_game",
            game = %id,
            kind = %envelope.kind,
            prover = %caller,
            %deadline,
            "Proof submitted"
        );
        self.emit(GameEvent::Proved {
            game: id,
            kind: envelope.kind,
            prover: caller,
            deadline,
        });
        Ok(deadline)
    }

    /// Checks whether `rival` may challenge game `id` at `now`, returning the rival's ZK prover.
    pub fn check_challenge(
        &self,
        id: GameId,
        rival: GameId,
        now: u64,
    ) -> Result<Option<Address>, GameError> {
        let game = self.game(id)?;
        if *game.status() != GameStatus::InProgress {
            return Err(GameError::ClaimAlreadyResolved);
        }
        if !self.is_valid(game) {
            return Err(GameError::InvalidGame);
        }
        if self.parent_status(game)? == GameStatus::ChallengerWins {
            return Err(GameError::InvalidParentGame);
        }
        if !game.proving().has(ProofKind::Tee) {
            return Err(GameError::MissingProof(ProofKind::Tee));
        }
        if game.proving().has(ProofKind::Zk) {
            return Err(GameError::AlreadyProven(ProofKind::Zk));
        }
        if game.deadline().has_passed(now) {
            return Err(GameError::GameOver);
        }

        let rival_game = self
            .games
            .get(rival.as_usize())
            .ok_or(GameError::InvalidGame)?;
        chain_rules!(
            rival,
            |r: GameId| check(rival_game.game_type() == game.game_type(), r),
            |r: GameId| check(rival_game.parent() == game.parent(), r),
            |r: GameId| check(rival_game.l2_sequence_number() == game.l2_sequence_number(), r),
            |r: GameId| check(rival_game.root_claim() != game.root_claim(), r),
            |r: GameId| check(rival_game.proving().has(ProofKind::Zk), r),
            |r: GameId| check(self.is_valid(rival_game), r)
        )?;
        Ok(rival_game.prover(ProofKind::Zk))
    }

    /// Challenges a TEE-only game with a ZK-proven rival for the same parent and sequence
    /// number. The game loses immediately and its bond goes to the rival's ZK prover once the
    /// rival is resolved in its favor.
    pub fn challenge(
        &mut self,
        id: GameId,
        caller: Address,
        rival: GameId,
        now: u64,
    ) -> Result<(), GameError> {
        let recipient = self.check_challenge(id, rival, now)?;

        let game = &mut self.games[id.as_usize()];
        game.countered_by = Some(rival);
        game.status = GameStatus::ChallengerWins;
        game.bond.recipient = recipient;
        info!(target: "dispute_game", game = %id, %rival, challenger = %caller, "Game challenged");
        self.emit(GameEvent::Challenged {
            game: id,
            rival,
            challenger: caller,
        });
        Ok(())
    }

    /// Proves that intermediate root `index` of a game is wrong by proving `proposed_root` for
    /// the same segment. The game loses and its bond is refunded to its creator, overriding the
    /// outcome of an earlier challenge.
    pub async fn nullify(
        &mut self,
        id: GameId,
        caller: Address,
        proof: &[u8],
        index: usize,
        proposed_root: Claim,
        now: u64,
    ) -> Result<(), GameError> {
        let game = self.game(id)?;
        let challenged =
            *game.status() == GameStatus::ChallengerWins && game.countered_by().is_some();
        if *game.status() != GameStatus::InProgress && !challenged {
            return Err(GameError::ClaimAlreadyResolved);
        }
        // A challenged bond is settled once unlocked for the rival's prover.
        if game.bond().unlocked || game.bond().claimed {
            return Err(GameError::ClaimAlreadyResolved);
        }

        let recorded = game
            .intermediate_roots()
            .get(index)
            .ok_or(GameError::InvalidIntermediateRootIndex(index))?;
        if *recorded == proposed_root {
            return Err(GameError::IntermediateRootSameAsProposed);
        }
        if game.deadline().has_passed(now) {
            return Err(GameError::GameOver);
        }

        let envelope = ProofEnvelope::decode(proof)?;
        if !game.proving().has(envelope.kind) {
            return Err(GameError::MissingProof(envelope.kind));
        }

        let interval = self.config.intermediate_block_interval;
        let starting = game.segment_start(index, interval);
        let ending = Proposal::new(
            proposed_root,
            game.starting().l2_sequence_number + interval * (index as u64 + 1),
        );
        self.verify_transition(&envelope, caller, starting, ending, vec![proposed_root])
            .await?;

        let game = &mut self.games[id.as_usize()];
        game.status = GameStatus::ChallengerWins;
        game.countered_by = None;
        game.bond.recipient = Some(game.creator);
        info!(target: "dispute_game", game = %id, index, nullifier = %caller, "Game nullified");
        self.emit(GameEvent::Nullified {
            game: id,
            intermediate_index: index,
            nullifier: caller,
        });
        Ok(())
    }

    /// Resolves a game once its parent is resolved and, unless the parent lost, its deadline has
    /// passed.
    pub fn resolve(&mut self, id: GameId, now: u64) -> Result<GameStatus, GameError> {
        let status = self.resolution(id, now)?;

        let game = &mut self.games[id.as_usize()];
        game.status = status;
        game.resolved_at = Some(now);
        game.bond.recipient = game.bond.recipient.or(Some(game.creator));
        info!(target: "dispute_game", game = %id, %status, "Game resolved");
        self.emit(GameEvent::Resolved { game: id, status });
        Ok(status)
    }

    /// Settles a game's bond in two calls: the first unlocks it in the escrow, the second
    /// withdraws it to the recipient once the escrow delay has passed.
    pub fn claim_credit(&mut self, id: GameId, now: u64) -> Result<CreditClaim, GameError> {
        let game = self.game(id)?;
        if game.bond().claimed {
            return Err(GameError::NoCreditToClaim);
        }
        let amount = game.bond().amount;
        let recipient = game.bond_recipient().ok_or(GameError::BondRecipientEmpty)?;

        if game.bond().unlocked {
            if !self.escrow.withdraw(id, recipient, amount, now)? {
                return Err(GameError::BondTransferFailed);
            }
            self.games[id.as_usize()].bond.claimed = true;
            info!(target: "dispute_game", game = %id, %recipient, %amount, "Bond claimed");
            self.emit(GameEvent::BondClaimed {
                game: id,
                recipient,
                amount,
            });
            return Ok(CreditClaim::Claimed { recipient, amount });
        }

        let mut recipient = recipient;

        if let Some(rival) = game.countered_by() {
            let rival = self.game(rival)?;
            let rival_lost = *rival.status() == GameStatus::ChallengerWins
                || self.anchor.is_game_blacklisted(rival)
                || self.anchor.is_game_retired(rival);
            if rival_lost {
                recipient = game.creator();
            } else if *rival.status() == GameStatus::InProgress {
                return Err(GameError::CounteredByGameNotResolved);
            }
        }

        self.escrow.unlock(id, recipient, amount, now)?;
        let game = &mut self.games[id.as_usize()];
        game.bond.unlocked = true;
        game.bond.recipient = Some(recipient);
        info!(target: "dispute_game", game = %id, %recipient, %amount, "Bond unlocked");
        self.emit(GameEvent::BondUnlocked {
            game: id,
            recipient,
            amount,
        });
        Ok(CreditClaim::Unlocked { recipient, amount })
    }

    /// Attempts to promote a resolved, finalized game to the anchor. A refusal by the anchor is
    /// logged and reported as `Ok(false)`.
    pub fn close_game(&mut self, id: GameId, now: u64) -> Result<bool, GameError> {
        let game = self.game(id)?;
        if !game.status().is_resolved() {
            return Err(GameError::GameNotResolved);
        }
        if !self.anchor.is_game_finalized(game, now) {
            return Err(GameError::GameNotFinalized);
        }

        match self.anchor.set_anchor_state(&self.games[id.as_usize()], now) {
            Ok(()) => {
                info!(target: "dispute_game", game = %id, "Anchor updated");
                self.emit(GameEvent::AnchorUpdated { game: id });
                Ok(true)
            }
            Err(err) => {
                warn!(target: "dispute_game", game = %id, %err, "Anchor refused game");
                Ok(false)
            }
        }
    }

    /// Checks `envelope` for the transition `starting -> ending` proven by `prover`.
    async fn verify_transition(
        &self,
        envelope: &ProofEnvelope,
        prover: Address,
        starting: Proposal,
        ending: Proposal,
        intermediate_roots: Vec<Claim>,
    ) -> Result<(), GameError> {
        let image_hash = self.config.image_hash(envelope.kind);
        let journal = JournalInputs {
            prover,
            starting,
            ending,
            intermediate_roots,
            config_hash: self.config.config_hash,
            image_hash,
        }
        .journal();

        let valid = self
            .verifiers
            .verify(envelope.kind, &envelope.body, image_hash, journal, prover)
            .await?;
        debug!(
            target: "dispute_game",
            kind = %envelope.kind,
            %prover,
            %journal,
            valid,
            "Verified transition"
        );
        if !valid {
            return Err(GameError::InvalidProof(envelope.kind));
        }
        Ok(())
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

/// Passes `rival` through when `condition` holds.
fn check(condition: bool, rival: GameId) -> Result<GameId, GameError> {
    if condition {
        Ok(rival)
    } else {
        Err(GameError::InvalidGame)
    }
}
