//! Construction of the journal, the hash of all public inputs a proof commits to.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::{sol, SolType};
use multiproof_primitives::{Claim, Proposal};

type JournalEncoding = sol! {
    tuple(address, bytes32, uint256, bytes32, uint256, bytes32[], bytes32, bytes32)
};

/// The public inputs of a state transition proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalInputs {
    /// The identity submitting the proof.
    pub prover: Address,
    /// The agreed-upon output root the transition starts from.
    pub starting: Proposal,
    /// The claimed output root the transition ends at.
    pub ending: Proposal,
    /// The intermediate roots between `starting` and `ending`, the last one equal to `ending.root`.
    pub intermediate_roots: Vec<Claim>,
    /// Hash of the rollup configuration.
    pub config_hash: B256,
    /// Identity of the program or enclave image the proof is produced by.
    pub image_hash: B256,
}

impl JournalInputs {
    /// Computes the journal: `keccak256(abi.encode(inputs))`.
    pub fn journal(&self) -> B256 {
        let encoded = JournalEncoding::abi_encode(&(
            self.prover,
            self.starting.root,
            U256::from(self.starting.l2_sequence_number),
            self.ending.root,
            U256::from(self.ending.l2_sequence_number),
            self.intermediate_roots.clone(),
            self.config_hash,
            self.image_hash,
        ));
        keccak256(encoded)
    }
}
