//! An in-memory anchor state registry.

use crate::{AggregateDisputeState, AnchorStateRegistry, GameId};
use alloy_primitives::Address;
use anyhow::{bail, ensure, Result};
use multiproof_primitives::{DisputeGame, GameStatus, GameType, Proposal};
use std::collections::HashSet;
use tracing::info;

/// Three and a half days, the airgap between a game's resolution and its finality.
pub const ANCHOR_FINALITY_DELAY: u64 = 302_400;

/// The [MemoryAnchorRegistry] holds the latest finalized output and the guardian-controlled
/// validity flags games are checked against.
#[derive(Debug, Clone)]
pub struct MemoryAnchorRegistry {
    guardian: Address,
    anchor: Proposal,
    anchor_game: Option<GameId>,
    respected_game_type: GameType,
    /// Games created at or before this timestamp are retired.
    retirement_timestamp: Option<u64>,
    blacklist: HashSet<GameId>,
    finality_delay: u64,
}

impl MemoryAnchorRegistry {
    pub fn new(guardian: Address, anchor: Proposal, respected_game_type: GameType) -> Self {
        Self {
            guardian,
            anchor,
            anchor_game: None,
            respected_game_type,
            retirement_timestamp: None,
            blacklist: HashSet::new(),
            finality_delay: ANCHOR_FINALITY_DELAY,
        }
    }

    pub fn with_finality_delay(mut self, seconds: u64) -> Self {
        self.finality_delay = seconds;
        self
    }

    /// The game that last updated the anchor, if any.
    pub const fn anchor_game(&self) -> Option<GameId> {
        self.anchor_game
    }

    pub const fn finality_delay(&self) -> u64 {
        self.finality_delay
    }

    pub fn blacklist_game(&mut self, caller: Address, game: GameId) -> Result<()> {
        self.only_guardian(caller)?;
        self.blacklist.insert(game);
        info!(target: "anchor_registry", %game, "Blacklisted game");
        Ok(())
    }

    pub fn set_respected_game_type(&mut self, caller: Address, game_type: GameType) -> Result<()> {
        self.only_guardian(caller)?;
        self.respected_game_type = game_type;
        info!(target: "anchor_registry", %game_type, "Updated respected game type");
        Ok(())
    }

    /// Retires every game created at or before `now`.
    pub fn update_retirement_timestamp(&mut self, caller: Address, now: u64) -> Result<()> {
        self.only_guardian(caller)?;
        self.retirement_timestamp = Some(now);
        info!(target: "anchor_registry", retirement_timestamp = now, "Retired existing games");
        Ok(())
    }

    fn only_guardian(&self, caller: Address) -> Result<()> {
        ensure!(caller == self.guardian, "caller {caller} is not the guardian");
        Ok(())
    }
}

impl AnchorStateRegistry for MemoryAnchorRegistry {
    fn anchor_root(&self) -> Proposal {
        self.anchor
    }

    fn respected_game_type(&self) -> GameType {
        self.respected_game_type
    }

    fn is_game_blacklisted(&self, game: &AggregateDisputeState) -> bool {
        self.blacklist.contains(&game.id())
    }

    fn is_game_retired(&self, game: &AggregateDisputeState) -> bool {
        self.retirement_timestamp
            .is_some_and(|retired| game.created_at() <= retired)
    }

    fn is_game_finalized(&self, game: &AggregateDisputeState, now: u64) -> bool {
        let airgapped = game
            .resolved_at()
            .is_some_and(|resolved| now.saturating_sub(resolved) > self.finality_delay);
        airgapped && !self.is_game_blacklisted(game) && !self.is_game_retired(game)
    }

    fn set_anchor_state(&mut self, game: &AggregateDisputeState, now: u64) -> Result<()> {
        if !game.was_respected() {
            bail!("game {} was not created with the respected game type", game.id());
        }
        if *game.status() != GameStatus::DefenderWins {
            bail!("game {} resolved as {}", game.id(), game.status());
        }
        if !self.is_game_finalized(game, now) {
            bail!("game {} is not finalized", game.id());
        }
        if game.l2_sequence_number() <= self.anchor.l2_sequence_number {
            bail!(
                "game {} does not advance the anchor past {}",
                game.id(),
                self.anchor.l2_sequence_number
            );
        }

        self.anchor = game.proposal();
        self.anchor_game = Some(game.id());
        info!(
            target: "anchor_registry",
            game = %game.id(),
            root = %self.anchor.root,
            l2_sequence_number = self.anchor.l2_sequence_number,
            "Updated anchor state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::{Bytes, B256};

    const GUARDIAN: Address = Address::repeat_byte(0x0f);

    fn registry() -> MemoryAnchorRegistry {
        MemoryAnchorRegistry::new(
            GUARDIAN,
            Proposal::new(B256::repeat_byte(1), 600),
            GameType::AGGREGATE,
        )
    }

    fn resolved_game(id: u32, seq: u64, resolved_at: u64) -> AggregateDisputeState {
        let mut game = AggregateDisputeState::new(
            GameId(id),
            B256::ZERO,
            GameType::AGGREGATE,
            B256::repeat_byte(id as u8 + 2),
            Bytes::new(),
            seq,
            None,
            vec![],
            Address::ZERO,
        );
        game.created_at = 100;
        game.was_respected = true;
        game.status = GameStatus::DefenderWins;
        game.resolved_at = Some(resolved_at);
        game
    }

    #[test]
    fn guardian_only_administration() {
        let mut registry = registry();
        let stranger = Address::repeat_byte(0x10);
        assert!(registry.blacklist_game(stranger, GameId(0)).is_err());
        assert!(registry.update_retirement_timestamp(stranger, 5).is_err());
        assert!(registry
            .set_respected_game_type(stranger, GameType(1))
            .is_err());
        registry
            .set_respected_game_type(GUARDIAN, GameType(1))
            .unwrap();
        assert_eq!(registry.respected_game_type(), GameType(1));
    }

    #[test]
    fn finality_requires_airgap() {
        let registry = registry();
        let game = resolved_game(0, 1_200, 1_000);
        assert!(!registry.is_game_finalized(&game, 1_000 + ANCHOR_FINALITY_DELAY));
        assert!(registry.is_game_finalized(&game, 1_001 + ANCHOR_FINALITY_DELAY));
    }

    #[test]
    fn blacklist_and_retirement_invalidate() {
        let mut registry = registry();
        let game = resolved_game(0, 1_200, 1_000);
        let now = 10_000_000;

        registry.update_retirement_timestamp(GUARDIAN, 99).unwrap();
        assert!(!registry.is_game_retired(&game));
        registry.update_retirement_timestamp(GUARDIAN, 100).unwrap();
        assert!(registry.is_game_retired(&game));
        assert!(!registry.is_game_finalized(&game, now));

        let other = resolved_game(1, 1_200, 1_000);
        let mut registry = self::registry();
        registry.blacklist_game(GUARDIAN, other.id()).unwrap();
        assert!(registry.is_game_blacklisted(&other));
        assert!(!registry.is_game_finalized(&other, now));
        assert!(registry.set_anchor_state(&other, now).is_err());
    }

    #[test]
    fn anchor_only_advances() {
        let mut registry = registry();
        let now = 10_000_000;

        let game = resolved_game(0, 1_200, 1_000);
        registry.set_anchor_state(&game, now).unwrap();
        assert_eq!(registry.anchor_root(), game.proposal());
        assert_eq!(registry.anchor_game(), Some(GameId(0)));

        let stale = resolved_game(1, 1_200, 1_000);
        assert!(registry.set_anchor_state(&stale, now).is_err());
        assert_eq!(registry.anchor_game(), Some(GameId(0)));
    }

    #[test]
    fn refuses_lost_or_unrespected_games() {
        let mut registry = registry();
        let now = 10_000_000;

        let mut lost = resolved_game(0, 1_200, 1_000);
        lost.status = GameStatus::ChallengerWins;
        assert!(registry.set_anchor_state(&lost, now).is_err());

        let mut unrespected = resolved_game(1, 1_200, 1_000);
        unrespected.was_respected = false;
        assert!(registry.set_anchor_state(&unrespected, now).is_err());
    }
}
