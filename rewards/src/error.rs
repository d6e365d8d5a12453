use thiserror::Error;
use tide_crypto::CryptoError;
use tide_types::{Address, Amount, ErrorKind, Timestamp};

#[derive(Debug, Error)]
pub enum RewardsError {
    #[error("snapshot index {index} is not the current index {current}")]
    NotCurrentIndex { index: u64, current: u64 },

    #[error("reward interval ends at {boundary}, now {now}")]
    IntervalNotElapsed { boundary: Timestamp, now: Timestamp },

    #[error("collateral reward pool holds {available}, snapshot needs {needed}")]
    InsufficientRewardPool { needed: Amount, available: Amount },

    #[error("smoothing pool holds {available}, snapshot needs {needed}")]
    InsufficientSmoothingPool { needed: Amount, available: Amount },

    #[error("no executed snapshot at index {0}")]
    UnknownSnapshot(u64),

    #[error("network {network} out of range ({networks} networks)")]
    NetworkOutOfRange { network: u32, networks: u32 },

    #[error("{claimer} already claimed index {index}")]
    AlreadyClaimed { index: u64, claimer: Address },

    #[error("merkle proof does not match snapshot root")]
    InvalidProof,

    #[error("claim exceeds what remains of snapshot {index}")]
    ClaimExceedsSnapshot { index: u64 },

    #[error("amount overflow")]
    Overflow,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl RewardsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RewardsError::AlreadyClaimed { .. } => ErrorKind::AlreadyExecuted,
            RewardsError::InsufficientRewardPool { .. }
            | RewardsError::InsufficientSmoothingPool { .. }
            | RewardsError::Overflow => ErrorKind::ArithmeticBound,
            RewardsError::ClaimExceedsSnapshot { .. } => ErrorKind::ConsistencyViolation,
            RewardsError::Crypto(e) => e.kind(),
            _ => ErrorKind::PreconditionViolation,
        }
    }
}
