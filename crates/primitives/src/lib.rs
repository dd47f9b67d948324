#![doc = include_str!("../README.md")]

//! Primitives for the multi-proof dispute game, an optimistic output-root protocol backed by
//! TEE attestations and zero-knowledge proofs.

mod dispute_game;
pub use dispute_game::{Claim, GameStatus, GameType, ProofKind, Proposal};

mod traits;
pub use traits::{DisputeGame, DisputeSolver};

pub mod rule;
