//! Public operations, grouped by the component they drive.
//!
//! Each operation is a method on [`Protocol`](crate::Protocol) that wraps
//! its body in a transaction. Bodies that several operations share live on
//! [`LedgerState`](crate::LedgerState).

mod bond;
mod collateral;
mod deposits;
mod exit;
mod guardian;
mod operators;
mod oracle;
mod rewards;
mod units;

pub use oracle::RewardVote;
pub use units::{StakeRequest, UnitRequest, VacantUnitRequest};
