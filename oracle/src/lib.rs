//! Oracle Consensus Engine.
//!
//! A fixed committee agrees on externally observed facts before they touch
//! ledger state. Every topic (network balances, collateral price, penalties,
//! reward snapshots) runs through the same [`ThresholdVote`]: one vote per
//! member per period, tallied by payload digest, executed at most once.

pub mod committee;
pub mod error;
pub mod network;
pub mod oracle;
pub mod submission;
pub mod vote;

pub use committee::Committee;
pub use error::OracleError;
pub use network::{NetworkBalances, NetworkPrices};
pub use oracle::Oracle;
pub use submission::{BalancesSubmission, PenaltySubmission, PriceSubmission, RewardSubmission};
pub use vote::{PeriodTally, ThresholdVote, VoteOutcome};
