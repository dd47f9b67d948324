//! Types related to the [crate::DisputeGame] trait.

use alloy_primitives::B256;
use anyhow::{bail, Error};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// The [Claim] type is an alias to [B256], used to deliniate a claim hash from a regular hash.
pub type Claim = B256;

/// The [GameType] is the numeric tag of the dispute game implementation a proposal was created
/// with. The anchor registry "respects" exactly one game type at a time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameType(pub u32);

impl GameType {
    /// The game type of the TEE + ZK aggregate verifier.
    pub const AGGREGATE: GameType = GameType(621);

    /// Returns the big-endian encoding of the tag, as used in game UUIDs.
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl From<u32> for GameType {
    fn from(value: u32) -> Self {
        GameType(value)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The [GameStatus] enum is used to indicate the status of a dispute game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// The [GameStatus::InProgress] variant is used to indicate that the dispute game is still in progress.
    InProgress = 0,
    /// The [GameStatus::ChallengerWins] variant is used to indicate that the challenger of the root claim has won the
    /// dispute game.
    ChallengerWins = 1,
    /// The [GameStatus::DefenderWins] variant is used to indicate that the defender of the root claim has won the
    /// dispute game.
    DefenderWins = 2,
}

impl GameStatus {
    /// Returns `true` once the game has left [GameStatus::InProgress].
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

impl TryFrom<u8> for GameStatus {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameStatus::InProgress),
            1 => Ok(GameStatus::ChallengerWins),
            2 => Ok(GameStatus::DefenderWins),
            _ => bail!("Invalid game status"),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::InProgress => write!(f, "IN_PROGRESS"),
            GameStatus::ChallengerWins => write!(f, "CHALLENGER_WINS"),
            GameStatus::DefenderWins => write!(f, "DEFENDER_WINS"),
        }
    }
}

/// The [ProofKind] enum identifies which proving system backs a proof attached to a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProofKind {
    /// An attestation-backed signature produced inside a trusted execution environment.
    Tee = 0,
    /// A succinct zero-knowledge proof checked by an external proof system.
    Zk = 1,
}

impl ProofKind {
    /// Every proof kind, in discriminant order.
    pub const ALL: [ProofKind; 2] = [ProofKind::Tee, ProofKind::Zk];

    /// Returns the position of the kind in fixed-size per-kind tables.
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl TryFrom<u8> for ProofKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ProofKind::Tee),
            1 => Ok(ProofKind::Zk),
            _ => bail!("Invalid proof kind"),
        }
    }
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofKind::Tee => write!(f, "TEE"),
            ProofKind::Zk => write!(f, "ZK"),
        }
    }
}

/// A [Proposal] is an output root claimed for a specific L2 sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Proposal {
    /// The claimed output root.
    pub root: Claim,
    /// The L2 sequence number (block number) the root commits to.
    pub l2_sequence_number: u64,
}

impl Proposal {
    pub const fn new(root: Claim, l2_sequence_number: u64) -> Self {
        Self {
            root,
            l2_sequence_number,
        }
    }
}
