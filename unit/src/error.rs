//! Staking-unit errors.

use thiserror::Error;
use tide_types::{ErrorKind, Timestamp, UnitId, UnitStatus};

#[derive(Debug, Error)]
pub enum UnitError {
    #[error("{unit} is {actual}, expected {expected}")]
    WrongStatus {
        unit: UnitId,
        expected: &'static str,
        actual: UnitStatus,
    },

    #[error("{unit} is already dissolved")]
    AlreadyDissolved { unit: UnitId },

    #[error("scrub window open until {until}")]
    ScrubWindowOpen { until: Timestamp },

    #[error("launch timeout not reached until {until}")]
    LaunchTimeoutPending { until: Timestamp },

    #[error("{voter} already voted on this unit")]
    DuplicateVote { voter: String },

    #[error("vacant units must be promoted, not staked")]
    VacantUnit,

    #[error("{unit} is not vacant")]
    NotVacant { unit: UnitId },

    #[error("bond {0} is not an allowed bond size")]
    BondNotAllowed(u128),

    #[error("new bond {new} must be below the current bond {current}")]
    BondNotReduced { current: u128, new: u128 },

    #[error("no bond reduction pending")]
    NoPendingReduction,

    #[error("a bond reduction is already pending")]
    ReductionPending,

    #[error("bond reduction was cancelled by the committee")]
    ReductionCancelled,

    #[error("bond reduction window opens at {opens}")]
    ReductionWindowNotOpen { opens: Timestamp },

    #[error("bond reduction window closed at {closed}")]
    ReductionWindowClosed { closed: Timestamp },

    #[error("balance {balance} is below the exit threshold {minimum}")]
    BelowExitBalance { balance: u128, minimum: u128 },

    #[error("balance {balance} is at or above the exit threshold {minimum}; use an exit distribution")]
    AboveRewardsOnly { balance: u128, minimum: u128 },

    #[error("user distribution not started")]
    UserDistributeNotStarted,

    #[error("user distribution already started, window expires at {expires}")]
    UserDistributeInProgress { expires: Timestamp },

    #[error("user distribution window opens at {opens}")]
    UserDistributeWindowNotOpen { opens: Timestamp },

    #[error("user distribution window expired at {expired}")]
    UserDistributeWindowExpired { expired: Timestamp },

    #[error("{unit} is already finalised")]
    AlreadyFinalised { unit: UnitId },

    #[error("{unit} is already closed")]
    AlreadyClosed { unit: UnitId },

    #[error("{unit} cannot close: not dissolved or finalised")]
    NotClosable { unit: UnitId },

    #[error("nothing to refund")]
    NothingToRefund,

    #[error("unit holds {held}, cannot release {requested}")]
    InsufficientBalance { requested: u128, held: u128 },

    #[error("arithmetic overflow in unit accounting")]
    Overflow,
}

impl UnitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UnitError::DuplicateVote { .. } => ErrorKind::DuplicateSubmission,
            UnitError::Overflow => ErrorKind::ArithmeticBound,
            UnitError::InsufficientBalance { .. } => ErrorKind::ConsistencyViolation,
            _ => ErrorKind::PreconditionViolation,
        }
    }
}
