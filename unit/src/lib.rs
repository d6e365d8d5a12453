//! Staking-Unit State Machine.
//!
//! One record per validator, progressing
//! `Initialized → Prelaunch → Staking → Withdrawable`, or ending `Dissolved`.
//!
//! This crate handles:
//! - Lifecycle transitions and their time locks (scrub window, launch timeout)
//! - Committee scrub votes and bond-reduction cancel votes
//! - Two-phase bond reduction
//! - Exit and reward-skim balance splits for every deposit type
//! - Cumulative penalty rates
//!
//! Records hold no money of their own; the engine moves capital and calls the
//! transitions here after every precondition has been checked.

pub mod bond;
pub mod distribution;
pub mod error;
pub mod penalty;
pub mod unit;

pub use bond::BondReduction;
pub use distribution::{split_exit_balance, split_rewards, Split, SplitTerms};
pub use error::UnitError;
pub use penalty::{PenaltyRecord, PenaltyTracker};
pub use unit::{NewUnit, StakingUnit};
