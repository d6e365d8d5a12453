//! Collateral ledger errors.

use thiserror::Error;
use tide_types::{ErrorKind, Timestamp};

#[derive(Debug, Error)]
pub enum CollateralError {
    #[error("insufficient stake: need {needed}, have {available}")]
    InsufficientStake { needed: u128, available: u128 },

    #[error("withdrawal would leave {remaining}, below the minimum {minimum}")]
    BelowMinimum { remaining: u128, minimum: u128 },

    #[error("matched capital {requested} would exceed the limit {limit}")]
    ExceedsMatchedLimit { requested: u128, limit: u128 },

    #[error("collateral locked until {unlocks_at}")]
    WithdrawalLocked { unlocks_at: Timestamp },

    #[error("cannot release {amount} of matched capital, only {matched} matched")]
    MatchedUnderflow { amount: u128, matched: u128 },

    #[error("collateral price must be non-zero")]
    ZeroPrice,

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow in collateral computation")]
    Overflow,
}

impl CollateralError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollateralError::InsufficientStake { .. }
            | CollateralError::BelowMinimum { .. }
            | CollateralError::ExceedsMatchedLimit { .. }
            | CollateralError::Overflow => ErrorKind::ArithmeticBound,
            CollateralError::WithdrawalLocked { .. }
            | CollateralError::ZeroPrice
            | CollateralError::ZeroAmount => ErrorKind::PreconditionViolation,
            CollateralError::MatchedUnderflow { .. } => ErrorKind::ConsistencyViolation,
        }
    }
}
