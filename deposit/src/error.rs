//! Deposit pool and matching errors.

use thiserror::Error;
use tide_types::{ErrorKind, UnitId};

#[derive(Debug, Error)]
pub enum DepositError {
    #[error("insufficient user balance: need {needed}, available {available}")]
    InsufficientUserBalance { needed: u128, available: u128 },

    #[error("insufficient node credit: need {needed}, available {available}")]
    InsufficientNodeCredit { needed: u128, available: u128 },

    #[error("deposits are disabled")]
    DepositsDisabled,

    #[error("deposit assignments are disabled")]
    AssignmentsDisabled,

    #[error("deposit {amount} is below the minimum {minimum}")]
    BelowMinimumDeposit { amount: u128, minimum: u128 },

    #[error("deposit would grow the pool to {would_be}, above the cap {cap}")]
    PoolFull { would_be: u128, cap: u128 },

    #[error("only {available} is free of queue demand, cannot withdraw {requested}")]
    ExcessUnavailable { requested: u128, available: u128 },

    #[error("{0} is not queued")]
    NotQueued(UnitId),

    #[error("{0} is already queued")]
    AlreadyQueued(UnitId),

    #[error("assignment moved {moved} but funded {funded}")]
    AssignmentMismatch { moved: u128, funded: u128 },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow in deposit pool")]
    Overflow,
}

impl DepositError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DepositError::InsufficientUserBalance { .. }
            | DepositError::InsufficientNodeCredit { .. }
            | DepositError::PoolFull { .. }
            | DepositError::ExcessUnavailable { .. }
            | DepositError::Overflow => ErrorKind::ArithmeticBound,
            DepositError::DepositsDisabled
            | DepositError::AssignmentsDisabled
            | DepositError::BelowMinimumDeposit { .. }
            | DepositError::NotQueued(_)
            | DepositError::AlreadyQueued(_)
            | DepositError::ZeroAmount => ErrorKind::PreconditionViolation,
            DepositError::AssignmentMismatch { .. } => ErrorKind::ConsistencyViolation,
        }
    }
}
