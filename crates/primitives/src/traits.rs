//! The traits module contains traits used throughout the library.

use crate::{dispute_game::Claim, GameStatus, GameType};

/// The [DisputeGame] trait is the highest level trait in the library, describing
/// the observable state of a single output-root proposal under dispute:
///
/// - It houses a root [Claim], a 32 byte commitment to the L2 state at
///   [DisputeGame::l2_sequence_number].
/// - It can exist in one of three states, as indicated by the [GameStatus] enum.
///     1. [GameStatus::InProgress] - The dispute game is still in progress.
///     2. [GameStatus::ChallengerWins] - The root claim was shown to be invalid.
///     3. [GameStatus::DefenderWins] - The root claim survived until its deadline.
/// - It records when it was created and, once it leaves [GameStatus::InProgress], when it
///   was resolved.
///
/// Transitions are not part of this trait, since they require collaborators (verifiers, the
/// anchor registry, sibling games) that only the owning factory can supply.
pub trait DisputeGame {
    /// Returns the tag of the game implementation.
    fn game_type(&self) -> GameType;

    /// Returns the root claim of the dispute game.
    fn root_claim(&self) -> Claim;

    /// Returns the L2 sequence number the root claim commits to.
    fn l2_sequence_number(&self) -> u64;

    /// Returns the current status of the dispute game.
    fn status(&self) -> &GameStatus;

    /// Returns the timestamp the game was created at.
    fn created_at(&self) -> u64;

    /// Returns the timestamp the game left [GameStatus::InProgress], if it has.
    fn resolved_at(&self) -> Option<u64>;
}

/// The [DisputeSolver] trait describes the base functionality of a solver (or monitor) for a
/// world of [DisputeGame]s. The consumer of the returned moves is responsible for dispatching
/// the actions associated with them.
pub trait DisputeSolver<W, R> {
    /// Returns every move available against `world` at timestamp `now`.
    fn available_moves(&self, world: &W, now: u64) -> Vec<R>;
}
