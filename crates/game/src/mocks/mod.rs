//! Deterministic stand-ins for the cryptographic services, plus a fully wired factory, for tests
//! and simulations.

mod attestation;
pub use self::attestation::{attestation, MockAttestationValidator};

mod proof_system;
pub use self::proof_system::MockProofSystem;

mod signer;
pub use self::signer::{mock_sign, MockSignerRecovery};

mod harness;
pub use self::harness::*;
