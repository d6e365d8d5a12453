//! Tide staking core.
//!
//! [`Protocol`] ties the deposit pool, staking units, collateral ledger,
//! oracle and reward accountant into one ledger. Every public operation:
//!
//! - takes a [`CallContext`] naming the caller, the attached value and the
//!   current time and block;
//! - runs against a working copy of the [`LedgerState`] and either commits
//!   entirely or leaves the state as it was;
//! - reports outbound value as [`Transfer`]s in the [`Outbox`], never by
//!   calling out.
//!
//! [`LedgerState::capital_audit`] checks that the inflows minus outflows of
//! each asset equal what the ledger holds.

pub mod config;
pub mod context;
pub mod error;
pub mod fault;
pub mod operator;
pub mod ops;
pub mod outbox;
pub mod protocol;
pub mod state;

pub use config::EngineConfig;
pub use context::CallContext;
pub use error::EngineError;
pub use fault::{FaultPlan, FaultPoint};
pub use operator::{split_distributor_balance, DistributorSplit, OperatorRecord, OperatorRegistry};
pub use ops::{RewardVote, StakeRequest, UnitRequest, VacantUnitRequest};
pub use outbox::{Asset, Event, Outbox, Transfer, TransferReason};
pub use protocol::{Protocol, Roles};
pub use state::{CapitalAudit, CapitalFlows, LedgerState};
