//! The rejection taxonomy shared by every component.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why an operation was rejected.
///
/// Every component error maps onto exactly one kind. Rejections are returned
/// synchronously; the core never retries or recovers locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Wrong state for the requested transition.
    PreconditionViolation,
    /// Caller is not the operator, not a committee member, or bootstrap is closed.
    AuthorizationViolation,
    /// A collateral ratio, balance floor or integer range would be breached.
    ArithmeticBound,
    /// Same voter, same period.
    DuplicateSubmission,
    /// The period has already been finalized.
    AlreadyExecuted,
    /// Internal invariant failure. Always fatal.
    ConsistencyViolation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::PreconditionViolation => "precondition violation",
            ErrorKind::AuthorizationViolation => "authorization violation",
            ErrorKind::ArithmeticBound => "arithmetic bound",
            ErrorKind::DuplicateSubmission => "duplicate submission",
            ErrorKind::AlreadyExecuted => "already executed",
            ErrorKind::ConsistencyViolation => "consistency violation",
        };
        f.write_str(s)
    }
}

/// Errors raised while constructing the shared types themselves.
#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid validator key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
}

impl TypesError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PreconditionViolation
    }
}
