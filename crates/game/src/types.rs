//! The types module holds the identifiers, time values and events of the game crate.

use alloy_primitives::{Address, B256, U256};
use multiproof_primitives::{Claim, GameStatus, ProofKind};
use std::fmt;

/// The [GameId] is the position of a game within its factory's arena. Parent and rival references
/// between games are [GameId]s rather than owning pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId(pub u32);

impl GameId {
    /// The wire encoding of "no parent" in a game's extra data.
    pub const NONE_SENTINEL: u32 = u32::MAX;

    /// Decodes a wire-level parent index, mapping the sentinel to [None].
    pub const fn from_parent_index(index: u32) -> Option<GameId> {
        if index == Self::NONE_SENTINEL {
            None
        } else {
            Some(GameId(index))
        }
    }

    /// Encodes an optional parent into its wire-level index.
    pub fn to_parent_index(parent: Option<GameId>) -> u32 {
        parent.map_or(Self::NONE_SENTINEL, |id| id.0)
    }

    /// The id of the game at arena position `index`, unless `index` does not fit below the
    /// sentinel.
    pub fn from_index(index: usize) -> Option<GameId> {
        u32::try_from(index)
            .ok()
            .filter(|index| *index != Self::NONE_SENTINEL)
            .map(GameId)
    }

    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The [Deadline] is the timestamp after which a game may be resolved. It starts at
/// [Deadline::NEVER] and only ever moves earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(u64);

impl Deadline {
    /// The deadline of a game that has no proof yet.
    pub const NEVER: Deadline = Deadline(u64::MAX);

    pub const fn at(timestamp: u64) -> Self {
        Deadline(timestamp)
    }

    pub const fn timestamp(&self) -> u64 {
        self.0
    }

    pub const fn is_never(&self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns `true` once `now` has reached the deadline.
    pub const fn has_passed(&self, now: u64) -> bool {
        now >= self.0
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Deadline::NEVER
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            write!(f, "never")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// The [GameEvent] enum holds the notifications emitted by successful game operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Created {
        game: GameId,
        uuid: B256,
        root_claim: Claim,
        creator: Address,
    },
    Proved {
        game: GameId,
        kind: ProofKind,
        prover: Address,
        deadline: Deadline,
    },
    Challenged {
        game: GameId,
        rival: GameId,
        challenger: Address,
    },
    Nullified {
        game: GameId,
        intermediate_index: usize,
        nullifier: Address,
    },
    Resolved {
        game: GameId,
        status: GameStatus,
    },
    BondUnlocked {
        game: GameId,
        recipient: Address,
        amount: U256,
    },
    BondClaimed {
        game: GameId,
        recipient: Address,
        amount: U256,
    },
    AnchorUpdated {
        game: GameId,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parent_index_sentinel() {
        assert_eq!(GameId::from_parent_index(u32::MAX), None);
        assert_eq!(GameId::from_parent_index(7), Some(GameId(7)));
        assert_eq!(GameId::to_parent_index(None), u32::MAX);
        assert_eq!(GameId::to_parent_index(Some(GameId(3))), 3);
    }

    #[test]
    fn arena_index_stops_below_sentinel() {
        assert_eq!(GameId::from_index(0), Some(GameId(0)));
        assert_eq!(
            GameId::from_index(u32::MAX as usize - 1),
            Some(GameId(u32::MAX - 1))
        );
        assert_eq!(GameId::from_index(u32::MAX as usize), None);
        assert_eq!(GameId::from_index(usize::MAX), None);
    }

    #[test]
    fn deadline_ordering() {
        assert!(Deadline::at(10) < Deadline::NEVER);
        assert!(Deadline::at(10).has_passed(10));
        assert!(!Deadline::at(10).has_passed(9));
        assert!(!Deadline::NEVER.has_passed(u64::MAX - 1));
        assert_eq!(Deadline::default(), Deadline::NEVER);
    }
}
