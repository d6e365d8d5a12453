//! Hashing primitives for the Tide staking core.
//!
//! - **Blake2b-256** for every digest
//! - Deterministic staking-unit addresses derived from `(operator, salt)`
//! - Withdrawal credentials and deposit-data roots bound at unit creation
//! - Sorted-pair merkle proofs for reward claims

pub mod address;
pub mod deposit;
pub mod error;
pub mod hash;
pub mod merkle;

pub use address::{derive_unit_address, withdrawal_credentials};
pub use deposit::deposit_data_root;
pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi, payload_digest};
pub use merkle::{merkle_proof, merkle_root, reward_leaf, verify_proof, RewardLeaf};
