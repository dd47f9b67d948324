//! The `config` module contains the [GameConfig] shared by every game a factory creates.

use alloy_primitives::{B256, U256};
use anyhow::{ensure, Result};
use multiproof_primitives::{GameType, ProofKind};
use serde::{Deserialize, Serialize};

/// One day, the finality delay of a game proven by both proof kinds.
pub const FAST_FINALITY_DELAY: u64 = 24 * 60 * 60;

/// Seven days, the finality delay of a game proven by a single proof kind.
pub const SLOW_FINALITY_DELAY: u64 = 7 * FAST_FINALITY_DELAY;

/// The [GameConfig] struct holds the immutable parameters of the aggregate dispute game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// The game type served by the factory.
    #[serde(default = "default_game_type")]
    pub game_type: GameType,
    /// The distance in L2 blocks between a proposal and its parent.
    pub block_interval: u64,
    /// The distance in L2 blocks between two consecutive intermediate roots.
    pub intermediate_block_interval: u64,
    /// The deadline extension applied once both proof kinds are present.
    #[serde(default = "default_fast_delay")]
    pub fast_finality_delay: u64,
    /// The deadline extension applied while only one proof kind is present.
    #[serde(default = "default_slow_delay")]
    pub slow_finality_delay: u64,
    /// The bond a creator must escrow.
    pub init_bond: U256,
    /// Hash of the rollup configuration that every journal commits to.
    pub config_hash: B256,
    /// Image fingerprint that TEE signers must have been registered under.
    pub tee_image_hash: B256,
    /// Program identifier that ZK proofs must be generated for.
    pub zk_image_hash: B256,
}

const fn default_game_type() -> GameType {
    GameType::AGGREGATE
}

const fn default_fast_delay() -> u64 {
    FAST_FINALITY_DELAY
}

const fn default_slow_delay() -> u64 {
    SLOW_FINALITY_DELAY
}

impl GameConfig {
    /// Parses and validates a [GameConfig] from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the interval arithmetic and delay ordering.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.block_interval >= 2,
            "block_interval must be at least 2, got {}",
            self.block_interval
        );
        ensure!(
            self.intermediate_block_interval != 0,
            "intermediate_block_interval cannot be 0"
        );
        ensure!(
            self.block_interval % self.intermediate_block_interval == 0,
            "intermediate_block_interval {} does not divide block_interval {}",
            self.intermediate_block_interval,
            self.block_interval
        );
        ensure!(
            self.fast_finality_delay <= self.slow_finality_delay,
            "fast_finality_delay must not exceed slow_finality_delay"
        );
        Ok(())
    }

    /// Returns the number of intermediate roots every proposal carries.
    pub const fn intermediate_root_count(&self) -> usize {
        (self.block_interval / self.intermediate_block_interval) as usize
    }

    /// Returns the image identity proofs of `kind` must be produced by.
    pub const fn image_hash(&self, kind: ProofKind) -> B256 {
        match kind {
            ProofKind::Tee => self.tee_image_hash,
            ProofKind::Zk => self.zk_image_hash,
        }
    }

    /// Returns the exact byte length of a well-formed extra data blob.
    pub const fn extra_data_len(&self) -> usize {
        32 + 4 + 32 * self.intermediate_root_count()
    }
}
