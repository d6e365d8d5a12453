//! Deposit Pool and Matching Engine.
//!
//! Pooled user capital and operator top-up credit wait here until a queued
//! staking unit can be funded. This crate handles:
//! - The two-part pool balance (user capital and node credit)
//! - The FIFO queue of units awaiting capital
//! - Assignment in FIFO and socialised modes, all-or-nothing per unit
//! - Deposit admission rules and receipt quotes
//! - The demand-driven node-fee curve

pub mod assign;
pub mod error;
pub mod fee;
pub mod pool;
pub mod queue;
pub mod receipt;

pub use assign::{assign, Assignment, AssignmentLimits, AssignmentMode, AssignmentPlan};
pub use error::DepositError;
pub use fee::node_fee;
pub use pool::DepositPool;
pub use queue::{QueueEntry, UnitQueue};
pub use receipt::{quote_receipt, DepositReceipt};
