//! Reward Distribution Accountant.
//!
//! Applies agreed reward snapshots exactly once per index and pays out
//! operator entitlements against the snapshot's merkle root.

pub mod accountant;
pub mod claim;
pub mod error;

pub use accountant::{ExecutedSnapshot, RewardAccountant, SnapshotPayout};
pub use claim::{Claim, ClaimPayout};
pub use error::RewardsError;
