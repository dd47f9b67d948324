//! The [GameMonitor] is a [DisputeSolver] over a whole [DisputeGameFactory]: it lists every
//! permissionless action that would currently succeed.

use crate::{AnchorStateRegistry, BondEscrow, DisputeGameFactory, GameId, ProofVerifier};
use multiproof_primitives::{DisputeGame, DisputeSolver, GameStatus, ProofKind};
use std::fmt;

/// A permissionless action against one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    Resolve(GameId),
    Challenge { game: GameId, rival: GameId },
    ClaimCredit(GameId),
    CloseGame(GameId),
}

impl fmt::Display for GameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameAction::Resolve(game) => write!(f, "resolve {game}"),
            GameAction::Challenge { game, rival } => write!(f, "challenge {game} with {rival}"),
            GameAction::ClaimCredit(game) => write!(f, "claim credit of {game}"),
            GameAction::CloseGame(game) => write!(f, "close {game}"),
        }
    }
}

/// The [GameMonitor] inspects the factory without mutating it. Actions are listed in arena order
/// and resolution of a parent is listed before its children's.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameMonitor;

impl<A, E, T, Z> DisputeSolver<DisputeGameFactory<A, E, T, Z>, GameAction> for GameMonitor
where
    A: AnchorStateRegistry,
    E: BondEscrow,
    T: ProofVerifier,
    Z: ProofVerifier,
{
    fn available_moves(
        &self,
        factory: &DisputeGameFactory<A, E, T, Z>,
        now: u64,
    ) -> Vec<GameAction> {
        let mut moves = Vec::new();
        for game in factory.games() {
            let id = game.id();
            match game.status() {
                GameStatus::InProgress => {
                    if factory.resolution(id, now).is_ok() {
                        moves.push(GameAction::Resolve(id));
                    } else if game.proving().has(ProofKind::Tee)
                        && !game.proving().has(ProofKind::Zk)
                    {
                        let rival = factory
                            .games()
                            .map(|rival| rival.id())
                            .find(|rival| factory.check_challenge(id, *rival, now).is_ok());
                        if let Some(rival) = rival {
                            moves.push(GameAction::Challenge { game: id, rival });
                        }
                    }
                }
                GameStatus::ChallengerWins | GameStatus::DefenderWins => {
                    if self.credit_claimable(factory, id, now) {
                        moves.push(GameAction::ClaimCredit(id));
                    }
                    if *game.status() == GameStatus::DefenderWins
                        && factory.anchor().is_game_finalized(game, now)
                        && game.l2_sequence_number()
                            > factory.anchor().anchor_root().l2_sequence_number
                    {
                        moves.push(GameAction::CloseGame(id));
                    }
                }
            }
        }
        moves
    }
}

impl GameMonitor {
    fn credit_claimable<A, E, T, Z>(
        &self,
        factory: &DisputeGameFactory<A, E, T, Z>,
        id: GameId,
        now: u64,
    ) -> bool
    where
        A: AnchorStateRegistry,
        E: BondEscrow,
        T: ProofVerifier,
        Z: ProofVerifier,
    {
        let Ok(game) = factory.game(id) else {
            return false;
        };
        if game.bond().claimed || game.bond_recipient().is_none() {
            return false;
        }
        if game.bond().unlocked {
            return factory
                .escrow()
                .withdrawable_at(id)
                .is_some_and(|ready_at| now >= ready_at);
        }
        match game.countered_by().map(|rival| factory.game(rival)) {
            Some(Ok(rival)) => *rival.status() != GameStatus::InProgress
                || factory.anchor().is_game_blacklisted(rival)
                || factory.anchor().is_game_retired(rival),
            Some(Err(_)) => false,
            None => true,
        }
    }
}
